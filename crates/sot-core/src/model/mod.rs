//! Domain entities
//!
//! A [`Volume`] is one tracked subvolume; a [`Snapshot`] is one named,
//! timestamped copy of it. Both carry an explicit registration state instead
//! of a nullable id: an entity is either known to the index or it is not.

pub mod snapshot;
pub mod volume;

pub use snapshot::{generate_name, Snapshot, SnapshotMap, SnapshotRecord, SnapshotState};
pub use volume::{Volume, VolumeState};

use chrono::{DateTime, Utc};

/// Convert a timestamp to the epoch-seconds representation stored in the index
pub fn to_epoch_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / 1_000_000.0
}

/// Inverse of [`to_epoch_seconds`]; out-of-range values clamp to the epoch
pub fn from_epoch_seconds(seconds: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros((seconds * 1_000_000.0).round() as i64)
        .unwrap_or_default()
}
