//! Destructive reindex from the on-disk storage tree
//!
//! Every directory directly under `.sot` is a volume (its path recovered by
//! unescaping the directory name) and every directory inside it is a
//! snapshot. The creation time of a snapshot is not stored on disk, so the
//! directory's change time stands in for it.

use super::{register_snapshot, register_volume, Index};
use crate::errors::{from_rusqlite, io_error, Result};
use crate::migrations::reset_schema;
use chrono::{DateTime, Utc};
use sot_core::model::{Snapshot, Volume};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Counts of what a rebuild put back into the index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub volumes: usize,
    pub snapshots: usize,
}

/// Sub-directories of `dir` as (name, path), sorted by name. Entries whose
/// names are not UTF-8 are skipped with a warning.
fn child_dirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| io_error("read_dir", dir, e))? {
        let entry = entry.map_err(|e| io_error("read_dir", dir, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| io_error("file_type", &entry.path(), e))?;
        if !file_type.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => dirs.push((name, entry.path())),
            Err(name) => tracing::warn!(name = ?name, "skipping non UTF-8 directory"),
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn change_time(path: &Path) -> Result<DateTime<Utc>> {
    let meta = fs::symlink_metadata(path).map_err(|e| io_error("stat", path, e))?;
    Ok(DateTime::from_timestamp(meta.ctime(), meta.ctime_nsec() as u32).unwrap_or_default())
}

impl Index {
    /// Drop and recreate the schema, then repopulate it from disk.
    ///
    /// The previous contents of the index (exact creation times,
    /// annotations, heads) are lost.
    pub fn rebuild(&mut self) -> Result<RebuildReport> {
        reset_schema(&mut self.conn)?;

        let storage = self.layout.storage_dir().to_path_buf();
        let mut report = RebuildReport::default();
        let tx = self.conn.transaction().map_err(from_rusqlite)?;

        for (escaped, volume_dir) in child_dirs(&storage)? {
            let mut volume = Volume::from_escaped(&self.layout, &escaped);
            register_volume(&tx, &mut volume)?;
            report.volumes += 1;

            for (name, snapshot_dir) in child_dirs(&volume_dir)? {
                let mut snapshot = Snapshot::new(&volume, name);
                snapshot.set_time(change_time(&snapshot_dir)?);
                register_snapshot(&tx, &mut snapshot)?;
                report.snapshots += 1;
            }
        }

        tx.commit().map_err(from_rusqlite)?;
        tracing::info!(
            volume_count = report.volumes,
            snapshot_count = report.snapshots,
            "index rebuilt"
        );
        Ok(report)
    }
}
