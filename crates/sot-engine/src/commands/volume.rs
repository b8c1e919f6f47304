//! Volume operations with boundary logging.
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for volume and snapshot
//! operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use only `tracing::debug!()` for internal details.

#![allow(clippy::result_large_err)]

use crate::session::Session;
use sot_core::errors::{ExError, ExErrorKind};
use sot_core::model::{Snapshot, SnapshotMap, Volume};
use sot_core::{log_op_end, log_op_error, log_op_start};
use sot_store::errors::{io_error, Result};
use sot_store::Entity;
use std::time::Instant;

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Verify the volume's live path is present and is a subvolume.
///
/// # Errors
///
/// `SubvolumeNotFound` when nothing is at the live path, `NotASubvolume`
/// when the driver does not recognise it.
pub fn ensure_exists(session: &Session, volume: &Volume) -> Result<()> {
    let driver = session.driver();
    volume.check_exists(|path| driver.is_subvolume(path))?;
    Ok(())
}

/// The volume's snapshots, newest first
pub fn snapshots(session: &Session, volume: &Volume) -> Result<SnapshotMap> {
    session.index().snapshots(volume)
}

/// The volume's head snapshot, if any
pub fn head(session: &Session, volume: &Volume) -> Result<Option<Snapshot>> {
    session.index().head(volume)
}

/// Point the head of `snapshot`'s volume at it.
///
/// # Errors
///
/// `SnapshotNotFound` when the snapshot is not registered.
pub fn set_head(session: &mut Session, snapshot: &Snapshot) -> Result<()> {
    session.index_mut().set_head(snapshot)
}

/// Every tracked volume, ordered by path
pub fn all(session: &Session) -> Result<Vec<Volume>> {
    session.index().volumes()
}

/// Delete the live subvolume. Snapshot history is kept.
///
/// # Errors
///
/// `SubvolumeNotFound` / `NotASubvolume` from the existence check,
/// `Physical` when the delete primitive fails.
pub fn delete_live(session: &Session, volume: &Volume) -> Result<()> {
    log_op_start!("volume_delete_live", volume = %volume);
    let start = Instant::now();

    let result = ensure_exists(session, volume).and_then(|()| {
        session
            .driver()
            .delete_subvolume(volume.realpath())
            .map_err(ExError::from)
    });
    if let Err(e) = result {
        log_op_error!(
            "volume_delete_live",
            e.clone(),
            duration_ms = elapsed_ms(start),
            volume = %volume
        );
        return Err(e);
    }

    log_op_end!("volume_delete_live", duration_ms = elapsed_ms(start), volume = %volume);
    Ok(())
}

/// Remove the volume's (empty) snapshot storage directory and unregister it.
///
/// # Errors
///
/// `VolumeNotEmpty` while the index still lists snapshots for the volume,
/// `Io` when the directory cannot be removed.
pub fn remove_storage(session: &mut Session, volume: &mut Volume) -> Result<()> {
    log_op_start!("volume_remove_storage", volume = %volume);
    let start = Instant::now();

    remove_storage_impl(session, volume).map_err(|e| {
        log_op_error!(
            "volume_remove_storage",
            e.clone(),
            duration_ms = elapsed_ms(start),
            volume = %volume
        );
        e
    })?;

    log_op_end!(
        "volume_remove_storage",
        duration_ms = elapsed_ms(start),
        volume = %volume
    );
    Ok(())
}

fn remove_storage_impl(session: &mut Session, volume: &mut Volume) -> Result<()> {
    let remaining = session.index().snapshots(volume)?;
    if !remaining.is_empty() {
        return Err(ExError::new(ExErrorKind::VolumeNotEmpty)
            .with_op("remove_storage")
            .with_volume(volume.key())
            .with_message(format!(
                "'{}' still has {} snapshot(s).",
                volume,
                remaining.len()
            )));
    }

    let dir = volume.storage_dir();
    if dir.exists() {
        std::fs::remove_dir(dir).map_err(|e| io_error("remove_storage", dir, e))?;
    }
    session.index_mut().unregister(Entity::Volume(volume))
}
