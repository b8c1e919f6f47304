//! Volume entity

use crate::codec::{escape, unescape};
use crate::errors::{Result, SotError};
use crate::layout::StorageLayout;
use std::path::{Path, PathBuf};

/// Whether the index knows this volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeState {
    Unregistered,
    Registered { id: i64 },
}

/// One tracked subvolume
///
/// Identity is the path relative to the tracked root. The escaped form of
/// that path names the volume's snapshot directory and keys the index.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    path: PathBuf,
    escaped_name: String,
    realpath: PathBuf,
    storage_dir: PathBuf,
    state: VolumeState,
}

impl Volume {
    /// Build an unregistered volume from a path already relative to the root
    pub fn new(layout: &StorageLayout, relative: impl AsRef<Path>) -> Self {
        let path = relative.as_ref().to_path_buf();
        let key = path.to_string_lossy().into_owned();
        let escaped_name = escape(&key);
        Self {
            realpath: layout.root().join(&path),
            storage_dir: layout.storage_dir().join(&escaped_name),
            escaped_name,
            path,
            state: VolumeState::Unregistered,
        }
    }

    /// Resolve a user-supplied path (absolute, cwd-relative or root-relative)
    ///
    /// # Errors
    ///
    /// `OutsideRoot` / `InvalidVolumePath` from [`StorageLayout::relativize`].
    pub fn resolve(layout: &StorageLayout, path: impl AsRef<Path>) -> Result<Self> {
        let relative = layout.relativize(path.as_ref())?;
        Ok(Self::new(layout, relative))
    }

    /// Rebuild a volume from the name of its snapshot directory
    pub fn from_escaped(layout: &StorageLayout, escaped_name: &str) -> Self {
        Self::new(layout, unescape(escaped_name))
    }

    /// Path relative to the tracked root
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The relative path as the index stores it
    pub fn key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub fn escaped_name(&self) -> &str {
        &self.escaped_name
    }

    /// Absolute location of the live subvolume
    pub fn realpath(&self) -> &Path {
        &self.realpath
    }

    /// Directory holding this volume's snapshots
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn state(&self) -> VolumeState {
        self.state
    }

    /// Index id, when registered
    pub fn id(&self) -> Option<i64> {
        match self.state {
            VolumeState::Registered { id } => Some(id),
            VolumeState::Unregistered => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.state, VolumeState::Registered { .. })
    }

    pub fn set_state(&mut self, state: VolumeState) {
        self.state = state;
    }

    /// Verify the live path is present and is a subvolume.
    ///
    /// # Errors
    ///
    /// `SubvolumeNotFound` when nothing is at the live path, `NotASubvolume`
    /// when something is there but `is_subvolume` rejects it.
    pub fn check_exists(&self, is_subvolume: impl Fn(&Path) -> bool) -> Result<()> {
        if !self.realpath.exists() {
            return Err(SotError::SubvolumeNotFound {
                path: self.realpath.clone(),
            });
        }
        if !is_subvolume(&self.realpath) {
            return Err(SotError::NotASubvolume {
                path: self.realpath.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
