//! Checkout of a snapshot onto the live volume.
//!
//! ## Steps (in order):
//! 1. The volume must have at least one snapshot (`NoSnapshots`)
//! 2. Resolve the target by name (`SnapshotNotFound`)
//! 3. Live path absent: materialise the target there, set head, done
//! 4. Live path present: it must be a subvolume (`NotASubvolume`)
//! 5. Delete the live subvolume (no implicit backup)
//! 6. Materialise the target as a writable copy at the live path
//! 7. Set head to the target
//!
//! A failure stops the sequence where it happened; nothing is rolled back.

#![allow(clippy::result_large_err)]

use super::snapshot::{find, load_to_path};
use super::volume::elapsed_ms;
use crate::session::Session;
use sot_core::errors::SotError;
use sot_core::model::{Snapshot, Volume};
use sot_core::{log_op_end, log_op_error, log_op_start};
use sot_store::errors::Result;
use std::time::Instant;

/// Replace the live volume with a writable copy of `target` and make it head.
///
/// With `target` omitted the current head is used, or the most recent
/// snapshot when no head is recorded.
///
/// # Errors
///
/// `NoSnapshots`, `SnapshotNotFound`, `NotASubvolume` or `Physical`, per
/// the step that failed.
pub fn switch(session: &mut Session, volume: &Volume, target: Option<&str>) -> Result<Snapshot> {
    log_op_start!("volume_switch", volume = %volume, target = target.unwrap_or("<head>"));
    let start = Instant::now();

    let snapshot = switch_impl(session, volume, target).map_err(|e| {
        log_op_error!(
            "volume_switch",
            e.clone(),
            duration_ms = elapsed_ms(start),
            volume = %volume
        );
        e
    })?;

    log_op_end!(
        "volume_switch",
        duration_ms = elapsed_ms(start),
        volume = %volume,
        snapshot = snapshot.name()
    );
    Ok(snapshot)
}

fn switch_impl(session: &mut Session, volume: &Volume, target: Option<&str>) -> Result<Snapshot> {
    let snapshots = session.index().snapshots(volume)?;
    let Some(newest) = snapshots.newest() else {
        return Err(SotError::NoSnapshots {
            volume: volume.key(),
        }
        .into());
    };

    let snapshot = match target {
        Some(name) => find(session, volume, name)?,
        None => match session.index().head(volume)? {
            Some(head) => head,
            None => newest.clone(),
        },
    };

    let live = volume.realpath();
    if live.exists() {
        let driver = session.driver();
        if !driver.is_subvolume(live) {
            return Err(SotError::NotASubvolume {
                path: live.to_path_buf(),
            }
            .into());
        }
        driver.delete_subvolume(live)?;
        tracing::debug!(volume = %volume, "live subvolume deleted");
    }

    load_to_path(session, &snapshot, live)?;
    session.index_mut().set_head(&snapshot)?;
    Ok(snapshot)
}
