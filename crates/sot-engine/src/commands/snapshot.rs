//! Snapshot operations.
//!
//! Each operation pairs one or more physical primitives with a single index
//! mutation. The physical side always runs first; when it fails the index
//! is not touched.
//!
//! ## Rename protocol
//! 1. Reject a name already used by a sibling (`SnapshotExists`)
//! 2. Clear the read-only property (btrfs refuses to move read-only subvolumes)
//! 3. Move the subvolume
//! 4. Set read-only again
//! 5. Persist the new name
//!
//! Once the move succeeds the new name is persisted even when step 4 fails;
//! the snapshot is then left writable and the error is returned.

#![allow(clippy::result_large_err)]

use super::volume::{elapsed_ms, ensure_exists};
use crate::session::Session;
use sot_core::errors::{ExError, ExErrorKind, SotError};
use sot_core::model::{Snapshot, Volume};
use sot_core::{log_op_end, log_op_error, log_op_start};
use sot_store::errors::{io_error, Result};
use sot_store::Entity;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Options for [`create`]
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Snapshot name; a random 8-hex-digit name is generated when `None`
    pub name: Option<String>,
    pub annotation: Option<String>,
    /// Replace an existing snapshot of the same name
    pub force: bool,
}

/// Reject names that cannot be a single directory entry.
///
/// # Errors
///
/// `InvalidInput` for empty names, `.`/`..`, or names containing `/`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("validate_name")
            .with_snapshot(name)
            .with_message(format!("'{}' is not a valid snapshot name.", name)));
    }
    Ok(())
}

/// Trim an annotation; blank text means no annotation.
pub fn normalize_annotation(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Look up a registered snapshot of `volume` by name.
///
/// # Errors
///
/// `SnapshotNotFound` when the index has no such snapshot.
pub fn find(session: &Session, volume: &Volume, name: &str) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new(volume, name);
    session.index().load(Entity::Snapshot(&mut snapshot), false)?;
    Ok(snapshot)
}

fn exists_error(snapshot: &Snapshot) -> ExError {
    SotError::SnapshotExists {
        volume: snapshot.volume().key(),
        name: snapshot.name().to_string(),
    }
    .into()
}

/// Whether `snapshot`'s name is taken, on disk or in the index
fn is_taken(session: &Session, snapshot: &Snapshot) -> Result<bool> {
    if snapshot.path().exists() {
        return Ok(true);
    }
    Ok(session
        .index()
        .snapshots(snapshot.volume())?
        .contains(snapshot.name()))
}

/// Snapshot the live volume read-only, register it and make it head.
///
/// # Errors
///
/// - `SubvolumeNotFound` / `NotASubvolume`: the live volume is unusable
/// - `SnapshotExists`: the name is taken and `force` is off
/// - `Physical`: the snapshot primitive failed (nothing is registered)
pub fn create(session: &mut Session, volume: &Volume, options: CreateOptions) -> Result<Snapshot> {
    log_op_start!("snapshot_create", volume = %volume);
    let start = Instant::now();

    let snapshot = create_impl(session, volume, options).map_err(|e| {
        log_op_error!(
            "snapshot_create",
            e.clone(),
            duration_ms = elapsed_ms(start),
            volume = %volume
        );
        e
    })?;

    log_op_end!(
        "snapshot_create",
        duration_ms = elapsed_ms(start),
        volume = %volume,
        snapshot = snapshot.name()
    );
    Ok(snapshot)
}

fn create_impl(session: &mut Session, volume: &Volume, options: CreateOptions) -> Result<Snapshot> {
    ensure_exists(session, volume)?;

    let mut snapshot = match options.name {
        Some(name) => {
            validate_name(&name)?;
            Snapshot::new(volume, name)
        }
        None => Snapshot::generated(volume),
    };

    if is_taken(session, &snapshot)? {
        if !options.force {
            return Err(exists_error(&snapshot));
        }
        let mut existing = Snapshot::new(volume, snapshot.name());
        if let Err(e) = session.index().load(Entity::Snapshot(&mut existing), false) {
            if e.kind() != ExErrorKind::SnapshotNotFound {
                return Err(e);
            }
        }
        tracing::debug!(snapshot = %existing, "replacing existing snapshot");
        delete_impl(session, &mut existing)?;
    }

    let storage = volume.storage_dir();
    std::fs::create_dir_all(storage).map_err(|e| io_error("create_storage", storage, e))?;
    session
        .driver()
        .create_snapshot(volume.realpath(), snapshot.path(), true)?;
    snapshot.set_readonly(true);

    snapshot.set_annotation(normalize_annotation(options.annotation));
    session
        .index_mut()
        .register(Entity::Snapshot(&mut snapshot))?;
    session.index_mut().set_head(&snapshot)?;
    Ok(snapshot)
}

/// Delete the physical snapshot, then drop it from the index.
///
/// A snapshot whose directory is already gone is only unregistered.
///
/// # Errors
///
/// `Physical` when clearing read-only or deleting fails; the index row is
/// kept in that case.
pub fn delete(session: &mut Session, snapshot: &mut Snapshot) -> Result<()> {
    log_op_start!(
        "snapshot_delete",
        volume = %snapshot.volume(),
        snapshot = snapshot.name()
    );
    let start = Instant::now();

    if let Err(e) = delete_impl(session, snapshot) {
        log_op_error!(
            "snapshot_delete",
            e.clone(),
            duration_ms = elapsed_ms(start),
            volume = %snapshot.volume(),
            snapshot = snapshot.name()
        );
        return Err(e);
    }

    log_op_end!(
        "snapshot_delete",
        duration_ms = elapsed_ms(start),
        volume = %snapshot.volume(),
        snapshot = snapshot.name()
    );
    Ok(())
}

fn delete_impl(session: &mut Session, snapshot: &mut Snapshot) -> Result<()> {
    if snapshot.path().exists() {
        let driver = session.driver();
        driver.set_read_only(snapshot.path(), false)?;
        snapshot.set_readonly(false);
        driver.delete_subvolume(snapshot.path())?;
    } else {
        tracing::warn!(snapshot = %snapshot, "snapshot directory already missing");
    }
    session
        .index_mut()
        .unregister(Entity::Snapshot(snapshot))
}

/// Rename a snapshot on disk and in the index.
///
/// # Errors
///
/// - `InvalidInput`: `new_name` is not a usable directory name
/// - `SnapshotNotFound`: `snapshot` is not registered
/// - `SnapshotExists`: a sibling already uses `new_name` (nothing changes)
/// - `Physical`: a primitive failed part-way
pub fn rename(session: &mut Session, snapshot: &mut Snapshot, new_name: &str) -> Result<()> {
    log_op_start!(
        "snapshot_rename",
        volume = %snapshot.volume(),
        snapshot = snapshot.name(),
        new_name = new_name
    );
    let start = Instant::now();

    if let Err(e) = rename_impl(session, snapshot, new_name) {
        log_op_error!(
            "snapshot_rename",
            e.clone(),
            duration_ms = elapsed_ms(start),
            volume = %snapshot.volume(),
            snapshot = snapshot.name()
        );
        return Err(e);
    }

    log_op_end!(
        "snapshot_rename",
        duration_ms = elapsed_ms(start),
        volume = %snapshot.volume(),
        snapshot = snapshot.name()
    );
    Ok(())
}

fn rename_impl(session: &mut Session, snapshot: &mut Snapshot, new_name: &str) -> Result<()> {
    validate_name(new_name)?;
    session.index().load(Entity::Snapshot(snapshot), false)?;

    let target = Snapshot::new(snapshot.volume(), new_name);
    if is_taken(session, &target)? {
        return Err(exists_error(&target));
    }

    let driver = session.driver();
    driver.set_read_only(snapshot.path(), false)?;
    snapshot.set_readonly(false);
    if let Err(e) = driver.rename(snapshot.path(), target.path()) {
        if let Err(restore) = driver.set_read_only(snapshot.path(), true) {
            tracing::warn!(snapshot = %snapshot, error = %restore, "could not restore read-only");
        } else {
            snapshot.set_readonly(true);
        }
        return Err(e.into());
    }
    let relock = driver.set_read_only(target.path(), true);

    // The move happened; the index follows it even if re-locking failed
    snapshot.set_name(new_name);
    session.index_mut().update(Entity::Snapshot(snapshot))?;
    relock?;
    snapshot.set_readonly(true);
    Ok(())
}

/// Replace the annotation; `None` or blank text clears it.
///
/// # Errors
///
/// `SnapshotNotFound` when the snapshot is not registered.
pub fn annotate(
    session: &mut Session,
    snapshot: &mut Snapshot,
    annotation: Option<String>,
) -> Result<()> {
    log_op_start!(
        "snapshot_annotate",
        volume = %snapshot.volume(),
        snapshot = snapshot.name()
    );
    let start = Instant::now();

    let result = session
        .index()
        .load(Entity::Snapshot(snapshot), false)
        .and_then(|()| {
            snapshot.set_annotation(normalize_annotation(annotation));
            session.index_mut().update(Entity::Snapshot(snapshot))
        });
    if let Err(e) = result {
        log_op_error!(
            "snapshot_annotate",
            e.clone(),
            duration_ms = elapsed_ms(start),
            snapshot = snapshot.name()
        );
        return Err(e);
    }

    log_op_end!(
        "snapshot_annotate",
        duration_ms = elapsed_ms(start),
        snapshot = snapshot.name()
    );
    Ok(())
}

/// Materialise a writable copy of `snapshot` at `workdir`. The index is not
/// touched.
///
/// # Errors
///
/// `InvalidInput` when `workdir` already exists, `Physical` when the
/// snapshot primitive fails.
pub fn load_to_path(session: &Session, snapshot: &Snapshot, workdir: &Path) -> Result<PathBuf> {
    log_op_start!(
        "snapshot_load",
        snapshot = snapshot.name(),
        path = %workdir.display()
    );
    let start = Instant::now();

    let result = if workdir.exists() {
        Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("load")
            .with_path(workdir)
            .with_message(format!("'{}' already exists.", workdir.display())))
    } else {
        session
            .driver()
            .create_snapshot(snapshot.path(), workdir, false)
            .map_err(ExError::from)
    };
    if let Err(e) = result {
        log_op_error!(
            "snapshot_load",
            e.clone(),
            duration_ms = elapsed_ms(start),
            snapshot = snapshot.name()
        );
        return Err(e);
    }

    log_op_end!(
        "snapshot_load",
        duration_ms = elapsed_ms(start),
        snapshot = snapshot.name(),
        path = %workdir.display()
    );
    Ok(workdir.to_path_buf())
}

/// Whether `snapshot` is its volume's current head
pub fn is_head(session: &Session, snapshot: &Snapshot) -> Result<bool> {
    let Some(id) = snapshot.id() else {
        return Ok(false);
    };
    Ok(session
        .index()
        .head(snapshot.volume())?
        .is_some_and(|head| head.id() == Some(id)))
}
