//! On-disk layout of a tracked root
//!
//! ```text
//! <root>/
//!   .sot/                     storage marker directory
//!     index.db                metadata index (derived cache)
//!     <escaped volume>/       one directory per tracked volume
//!       <snapshot name>/      one read-only subvolume per snapshot
//! ```

use crate::codec::escape;
use crate::errors::{Result, SotError};
use std::path::{Component, Path, PathBuf};

/// Name of the hidden storage directory at the tracked root
pub const STORAGE_DIR: &str = ".sot";

/// File name of the SQLite index inside the storage directory
pub const INDEX_FILE: &str = "index.db";

/// Display format for snapshot timestamps
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Resolved locations for one tracked root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
    storage: PathBuf,
}

impl StorageLayout {
    /// Layout for an explicit root; the root is canonicalised when it exists.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let storage = root.join(STORAGE_DIR);
        Self { root, storage }
    }

    /// Walk upward from `start` until a directory containing the storage
    /// marker is found.
    ///
    /// # Errors
    ///
    /// `NoStorage` when the filesystem root is reached without a match.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref();
        let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
        start
            .ancestors()
            .find(|dir| dir.join(STORAGE_DIR).is_dir())
            .map(Self::new)
            .ok_or(SotError::NoStorage { start })
    }

    /// The tracked root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The hidden storage directory (`<root>/.sot`)
    pub fn storage_dir(&self) -> &Path {
        &self.storage
    }

    /// Location of the index database
    pub fn index_path(&self) -> PathBuf {
        self.storage.join(INDEX_FILE)
    }

    /// Whether the storage marker directory exists
    pub fn is_initialized(&self) -> bool {
        self.storage.is_dir()
    }

    /// Snapshot directory for a volume, given its path relative to the root
    pub fn volume_storage(&self, relative: &str) -> PathBuf {
        self.storage.join(escape(relative))
    }

    /// Map a user-supplied volume path onto a root-relative path.
    ///
    /// A path that exists as given (absolute, or relative to the current
    /// directory) is canonicalised and must lie under the root. Anything else
    /// is taken as already relative to the root; `.` components are dropped.
    ///
    /// # Errors
    ///
    /// `OutsideRoot` for an existing path outside the root,
    /// `InvalidVolumePath` for the root itself or a path escaping it.
    pub fn relativize(&self, path: &Path) -> Result<PathBuf> {
        let relative = if path.exists() {
            let absolute = path
                .canonicalize()
                .map_err(|e| SotError::physical("canonicalize", path, &e))?;
            absolute
                .strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .map_err(|_| SotError::OutsideRoot {
                    path: absolute.clone(),
                    root: self.root.clone(),
                })?
        } else if path.is_absolute() {
            path.strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .map_err(|_| SotError::OutsideRoot {
                    path: path.to_path_buf(),
                    root: self.root.clone(),
                })?
        } else {
            path.to_path_buf()
        };

        let relative: PathBuf = relative
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        let normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if relative.as_os_str().is_empty() || !normal || relative.starts_with(STORAGE_DIR) {
            return Err(SotError::InvalidVolumePath {
                path: path.display().to_string(),
            });
        }
        Ok(relative)
    }
}
