//! sot core - path codec, storage layout, domain entities and facilities
//!
//! This crate provides the pieces every other sot crate builds on:
//! - Reversible path codec mapping volume paths to flat directory names
//! - Storage layout of a tracked root and upward discovery of `.sot`
//! - `Volume` / `Snapshot` entities with explicit registration state
//! - The `SubvolumeDriver` seam over the filesystem's copy-on-write primitives
//! - Error facility (`ExError`) and structured logging facility

pub mod codec;
pub mod errors;
pub mod layout;
pub mod logging_facility;
pub mod model;
pub mod subvolume;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, SotError};
pub use layout::StorageLayout;
pub use model::{Snapshot, SnapshotMap, SnapshotRecord, SnapshotState, Volume, VolumeState};
pub use subvolume::{BtrfsDriver, DriverKind, PlainDriver, SubvolumeDriver};
