//! sot store - persistence layer for the snapshot metadata index
//!
//! Provides:
//! - SQLite connection management and embedded migrations
//! - The `Index`: volumes, snapshots and head pointers
//! - Destructive rebuild of the index from the on-disk storage tree

pub mod db;
pub mod errors;
pub mod index;
pub mod migrations;

// Re-export key types
pub use errors::Result;
pub use index::{Entity, Index, RebuildReport};
