//! Command orchestration layer.
//!
//! Provides high-level command functions that coordinate the physical
//! subvolume driver with the metadata index.

pub mod init;
pub mod listing;
pub mod prune;
pub mod snapshot;
pub mod switch;
pub mod volume;
