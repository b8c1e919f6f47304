//! Physical subvolume primitives
//!
//! The copy-on-write mechanics belong to the filesystem. This module only
//! names the primitives the engine needs and provides two drivers:
//!
//! - [`BtrfsDriver`] calls the `btrfs` tool
//! - [`PlainDriver`] treats directories as subvolumes and copies trees, for
//!   filesystems without snapshots and for tests

mod btrfs;
mod plain;

pub use btrfs::BtrfsDriver;
pub use plain::PlainDriver;

use crate::errors::Result;
use std::path::Path;

/// Filesystem primitives used by snapshot operations
pub trait SubvolumeDriver {
    /// Snapshot `source` at `dest`.
    ///
    /// # Errors
    ///
    /// Fails when `dest` exists or `source` is not a subvolume.
    fn create_snapshot(&self, source: &Path, dest: &Path, readonly: bool) -> Result<()>;

    /// Toggle the read-only property of a subvolume.
    ///
    /// # Errors
    ///
    /// `Physical` when the property cannot be changed.
    fn set_read_only(&self, path: &Path, readonly: bool) -> Result<()>;

    /// Delete a subvolume.
    ///
    /// # Errors
    ///
    /// Fails when the subvolume is busy or contains nested subvolumes.
    fn delete_subvolume(&self, path: &Path) -> Result<()>;

    /// Whether `path` is a subvolume root
    fn is_subvolume(&self, path: &Path) -> bool;

    /// Move a (writable) subvolume within the same filesystem.
    ///
    /// # Errors
    ///
    /// `Physical` with the OS error when the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::rename(from, to).map_err(|e| crate::errors::SotError::physical("rename", from, &e))
    }
}

/// Driver selection, as accepted by `--driver`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Btrfs,
    Plain,
}

impl DriverKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "btrfs" => Some(DriverKind::Btrfs),
            "plain" => Some(DriverKind::Plain),
            _ => None,
        }
    }

    pub fn driver(self) -> Box<dyn SubvolumeDriver> {
        match self {
            DriverKind::Btrfs => Box::new(BtrfsDriver::default()),
            DriverKind::Plain => Box::new(PlainDriver),
        }
    }
}
