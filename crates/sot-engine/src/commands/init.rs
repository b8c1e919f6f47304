//! Storage initialisation and index rebuild

#![allow(clippy::result_large_err)]

use super::volume::elapsed_ms;
use crate::session::Session;
use sot_core::errors::{ExError, ExErrorKind};
use sot_core::layout::StorageLayout;
use sot_core::{log_op_end, log_op_error, log_op_start};
use sot_store::errors::{io_error, Result};
use sot_store::{Index, RebuildReport};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What `init` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub root: PathBuf,
    /// Set when existing storage was re-indexed (`force`)
    pub rebuilt: Option<RebuildReport>,
}

/// Create `<root>/.sot` with an empty index.
///
/// With `force`, an existing storage directory is kept and its index
/// rebuilt from the directory tree.
///
/// # Errors
///
/// - `InvalidInput`: `root` is not a directory
/// - `AlreadyInitialized`: storage exists and `force` is off
/// - `Io` / `Persistence`: the directory or database cannot be created
pub fn init(root: &Path, force: bool) -> Result<InitReport> {
    log_op_start!("storage_init", path = %root.display(), force = force);
    let start = Instant::now();

    let report = init_impl(root, force).map_err(|e| {
        log_op_error!("storage_init", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        "storage_init",
        duration_ms = elapsed_ms(start),
        path = %report.root.display()
    );
    Ok(report)
}

fn init_impl(root: &Path, force: bool) -> Result<InitReport> {
    if !root.is_dir() {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("init")
            .with_path(root)
            .with_message(format!("'{}' is not a directory.", root.display())));
    }

    let layout = StorageLayout::new(root);
    let existed = layout.is_initialized();
    if existed && !force {
        return Err(ExError::new(ExErrorKind::AlreadyInitialized)
            .with_op("init")
            .with_path(layout.storage_dir())
            .with_message(format!(
                "Storage already initialized at '{}'.",
                layout.storage_dir().display()
            )));
    }

    let storage = layout.storage_dir();
    std::fs::create_dir_all(storage).map_err(|e| io_error("init", storage, e))?;

    let root = layout.root().to_path_buf();
    let mut index = Index::open_layout(layout)?;
    let rebuilt = if existed {
        Some(index.rebuild()?)
    } else {
        None
    };
    index.close()?;
    Ok(InitReport { root, rebuilt })
}

/// Destructively re-index the session's root from disk.
///
/// # Errors
///
/// `Io` when the storage tree cannot be read, `Persistence` on database
/// failures.
pub fn rebuild(session: &mut Session) -> Result<RebuildReport> {
    log_op_start!("index_rebuild");
    let start = Instant::now();

    let report = session.index_mut().rebuild().map_err(|e| {
        log_op_error!("index_rebuild", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        "index_rebuild",
        duration_ms = elapsed_ms(start),
        volume_count = report.volumes,
        snapshot_count = report.snapshots
    );
    Ok(report)
}
