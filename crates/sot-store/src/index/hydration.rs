//! Hydration layer - turns index rows back into domain entities
//!
//! Every snapshot query selects the same column list so one row mapper
//! serves lookups, listings and the head pointer.

use sot_core::model::{from_epoch_seconds, Snapshot, SnapshotRecord, Volume, VolumeState};

/// Columns expected by [`snapshot_from_row`], given aliases `s` (snapshots)
/// and `v` (volumes)
pub(crate) const SNAPSHOT_COLUMNS: &str = "s.id, s.name, s.time, s.annotation, v.id";

/// Build a registered snapshot of `volume` from a row selected with
/// [`SNAPSHOT_COLUMNS`]
pub(crate) fn snapshot_from_row(volume: &Volume, row: &rusqlite::Row<'_>) -> rusqlite::Result<Snapshot> {
    let id: i64 = row.get(0)?;
    let name: String = row.get(1)?;
    let time: f64 = row.get(2)?;
    let annotation: Option<String> = row.get(3)?;
    let volume_id: i64 = row.get(4)?;

    let mut snapshot = Snapshot::new(volume, name);
    snapshot
        .volume_mut()
        .set_state(VolumeState::Registered { id: volume_id });
    snapshot.hydrate(SnapshotRecord {
        id,
        time: from_epoch_seconds(time),
        annotation,
    });
    Ok(snapshot)
}
