//! Migration framework
//!
//! Provides:
//! - Migration runner with recorded checksums
//! - Idempotent application
//! - Embedded SQL migrations
//! - Schema reset for the destructive rebuild path

mod checksums;
mod embedded;
mod runner;

pub use runner::{apply_migrations, reset_schema};
