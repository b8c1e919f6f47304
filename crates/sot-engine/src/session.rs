//! Per-command context
//!
//! A [`Session`] bundles the open index of a tracked root with the physical
//! driver. It is opened once when a command starts, handed to every
//! operation, and closed when the command ends.

#![allow(clippy::result_large_err)]

use sot_core::layout::StorageLayout;
use sot_core::model::Volume;
use sot_core::subvolume::SubvolumeDriver;
use sot_store::errors::Result;
use sot_store::{Entity, Index};
use std::path::Path;

pub struct Session {
    index: Index,
    driver: Box<dyn SubvolumeDriver>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("index", &self.index).finish()
    }
}

impl Session {
    /// Open the index of `root` (or the nearest tracked root above the
    /// current directory).
    ///
    /// # Errors
    ///
    /// `NoStorage` when no tracked root is found, `Persistence` when the
    /// database cannot be opened or migrated.
    pub fn open(root: Option<&Path>, driver: Box<dyn SubvolumeDriver>) -> Result<Self> {
        let index = Index::open(root)?;
        Ok(Self { index, driver })
    }

    /// Wrap an index that is already open
    pub fn with_index(index: Index, driver: Box<dyn SubvolumeDriver>) -> Self {
        Self { index, driver }
    }

    /// Release the index connection.
    ///
    /// # Errors
    ///
    /// `Persistence` when SQLite refuses to close.
    pub fn close(self) -> Result<()> {
        self.index.close()
    }

    pub fn layout(&self) -> &StorageLayout {
        self.index.layout()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    pub fn driver(&self) -> &dyn SubvolumeDriver {
        self.driver.as_ref()
    }

    /// Resolve a user-supplied volume path and hydrate its registration
    /// state. The live subvolume is not required to exist.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for paths outside the root or naming the root itself.
    pub fn volume(&self, path: impl AsRef<Path>) -> Result<Volume> {
        let mut volume = Volume::resolve(self.layout(), path)?;
        self.index.load(Entity::Volume(&mut volume), false)?;
        Ok(volume)
    }
}
