//! sot engine - orchestration layer
//!
//! Coordinates the physical subvolume primitives with the metadata index.
//! Every mutating operation runs its physical step first and only then
//! touches the index, so a failed filesystem call never leaves the index
//! claiming something that is not on disk.

pub mod commands;
pub mod session;

pub use session::Session;
