//! Metadata index
//!
//! A SQLite cache of which volumes and snapshots exist, their times and
//! annotations, and each volume's head. The directory tree under `.sot` is
//! authoritative; [`Index::rebuild`] reconstructs this cache from it.

#![allow(clippy::result_large_err)]

mod hydration;
mod rebuild;

pub use rebuild::RebuildReport;

use crate::db;
use crate::errors::{from_rusqlite, io_error, Result};
use crate::migrations::apply_migrations;
use hydration::{snapshot_from_row, SNAPSHOT_COLUMNS};
use rusqlite::{Connection, OptionalExtension};
use sot_core::errors::{ExError, ExErrorKind, SotError};
use sot_core::layout::StorageLayout;
use sot_core::model::{to_epoch_seconds, Snapshot, SnapshotMap, SnapshotRecord, Volume, VolumeState};
use std::path::Path;

/// An entity the index can persist
///
/// Register, unregister, load and update match on this exhaustively instead
/// of inspecting the runtime type of their argument.
#[derive(Debug)]
pub enum Entity<'a> {
    Volume(&'a mut Volume),
    Snapshot(&'a mut Snapshot),
}

/// Open handle on a tracked root's index
///
/// Created once per command and passed to every operation that needs it;
/// [`Index::close`] releases the connection.
pub struct Index {
    conn: Connection,
    layout: StorageLayout,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("root", &self.layout.root())
            .finish()
    }
}

impl Index {
    /// Open the index of `root`, or of the nearest tracked root above the
    /// current directory when `root` is `None`.
    ///
    /// # Errors
    ///
    /// `NoStorage` when no `.sot` directory is found (or `root` has none).
    pub fn open(root: Option<&Path>) -> Result<Self> {
        let layout = match root {
            Some(root) => StorageLayout::new(root),
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|e| io_error("current_dir", Path::new("."), e))?;
                StorageLayout::discover(cwd)?
            }
        };
        Self::open_layout(layout)
    }

    /// Open the index of an already-resolved layout.
    ///
    /// # Errors
    ///
    /// `NoStorage` when the storage directory is missing.
    pub fn open_layout(layout: StorageLayout) -> Result<Self> {
        if !layout.is_initialized() {
            return Err(SotError::NoStorage {
                start: layout.root().to_path_buf(),
            }
            .into());
        }
        let mut conn = db::open(layout.index_path())?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        tracing::debug!(root = %layout.root().display(), "index opened");
        Ok(Self { conn, layout })
    }

    /// In-memory index over `layout` (for testing); the storage directory
    /// need not exist.
    pub fn open_in_memory(layout: StorageLayout) -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn, layout })
    }

    /// Release the connection.
    ///
    /// # Errors
    ///
    /// `Persistence` when SQLite refuses to close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| from_rusqlite(e))
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Raw connection, for inspection in tests and diagnostics
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Idempotent upsert; returns the entity's id.
    ///
    /// A volume with an existing path keeps its id. A snapshot registers
    /// its parent volume first, then inserts or replaces its own row
    /// (keeping the id when `(volume, name)` already exists).
    pub fn register(&mut self, entity: Entity<'_>) -> Result<i64> {
        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let id = match entity {
            Entity::Volume(volume) => register_volume(&tx, volume)?,
            Entity::Snapshot(snapshot) => register_snapshot(&tx, snapshot)?,
        };
        tx.commit().map_err(from_rusqlite)?;
        Ok(id)
    }

    /// Remove an entity's row. Removing a volume cascades to its snapshots
    /// and head; removing a snapshot clears any head pointing at it.
    /// Removing a row that is already gone is not an error.
    pub fn unregister(&mut self, entity: Entity<'_>) -> Result<()> {
        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let removed = match entity {
            Entity::Volume(volume) => {
                let removed = tx
                    .execute("DELETE FROM volumes WHERE path = ?1", [volume.key()])
                    .map_err(from_rusqlite)?;
                volume.set_state(VolumeState::Unregistered);
                removed
            }
            Entity::Snapshot(snapshot) => {
                let removed = tx
                    .execute(
                        "DELETE FROM snapshots
                         WHERE name = ?1
                           AND volume_id = (SELECT id FROM volumes WHERE path = ?2)",
                        rusqlite::params![snapshot.name(), snapshot.volume().key()],
                    )
                    .map_err(from_rusqlite)?;
                snapshot.unregistered();
                removed
            }
        };
        tx.commit().map_err(from_rusqlite)?;
        if removed == 0 {
            tracing::debug!("unregister found no row");
        }
        Ok(())
    }

    /// Hydrate id, time and annotation from the index by natural key.
    ///
    /// No-op for an already registered entity unless `force`. An unknown
    /// volume is left unregistered.
    ///
    /// # Errors
    ///
    /// `SnapshotNotFound` for an unknown snapshot.
    pub fn load(&self, entity: Entity<'_>, force: bool) -> Result<()> {
        match entity {
            Entity::Volume(volume) => {
                if volume.is_registered() && !force {
                    return Ok(());
                }
                let state = match volume_id(&self.conn, volume)? {
                    Some(id) => VolumeState::Registered { id },
                    None => VolumeState::Unregistered,
                };
                volume.set_state(state);
            }
            Entity::Snapshot(snapshot) => {
                if snapshot.is_registered() && !force {
                    return Ok(());
                }
                let loaded = self
                    .conn
                    .query_row(
                        &format!(
                            "SELECT {SNAPSHOT_COLUMNS} FROM snapshots s
                             JOIN volumes v ON v.id = s.volume_id
                             WHERE v.path = ?1 AND s.name = ?2"
                        ),
                        rusqlite::params![snapshot.volume().key(), snapshot.name()],
                        |row| snapshot_from_row(snapshot.volume(), row),
                    )
                    .optional()
                    .map_err(from_rusqlite)?;
                match loaded {
                    Some(loaded) => *snapshot = loaded,
                    None => return Err(snapshot_not_found(snapshot)),
                }
            }
        }
        Ok(())
    }

    /// Persist a snapshot's mutated name and annotation by id.
    ///
    /// A volume has no mutable fields: its path is its identity.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a volume, `SnapshotNotFound` when the snapshot is
    /// not registered or its row has disappeared.
    pub fn update(&mut self, entity: Entity<'_>) -> Result<()> {
        let snapshot = match entity {
            Entity::Snapshot(snapshot) => snapshot,
            Entity::Volume(volume) => {
                return Err(ExError::new(ExErrorKind::InvalidInput)
                    .with_op("update")
                    .with_volume(volume.key())
                    .with_message("Volumes have no updatable fields."));
            }
        };
        let Some(id) = snapshot.id() else {
            return Err(snapshot_not_found(snapshot).with_op("update"));
        };

        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let changed = tx
            .execute(
                "UPDATE snapshots SET name = ?1, annotation = ?2 WHERE id = ?3",
                rusqlite::params![snapshot.name(), snapshot.annotation(), id],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Err(snapshot_not_found(snapshot).with_op("update"));
        }
        tx.commit().map_err(from_rusqlite)?;
        Ok(())
    }

    /// All snapshots of `volume`, newest first
    pub fn snapshots(&self, volume: &Volume) -> Result<SnapshotMap> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {SNAPSHOT_COLUMNS} FROM snapshots s
                 JOIN volumes v ON v.id = s.volume_id
                 WHERE v.path = ?1
                 ORDER BY s.time DESC, s.id DESC"
            ))
            .map_err(from_rusqlite)?;
        let snapshots = stmt
            .query_map([volume.key()], |row| snapshot_from_row(volume, row))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(SnapshotMap::from_ordered(snapshots))
    }

    /// All tracked volumes, ordered by path
    pub fn volumes(&self) -> Result<Vec<Volume>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path FROM volumes ORDER BY path")
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows
            .into_iter()
            .map(|(id, path)| {
                let mut volume = Volume::new(&self.layout, path);
                volume.set_state(VolumeState::Registered { id });
                volume
            })
            .collect())
    }

    /// The volume's head snapshot, if one is recorded and still exists
    pub fn head(&self, volume: &Volume) -> Result<Option<Snapshot>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {SNAPSHOT_COLUMNS} FROM head h
                     JOIN volumes v ON v.id = h.volume_id
                     JOIN snapshots s ON s.id = h.head_snapshot_id
                     WHERE v.path = ?1"
                ),
                [volume.key()],
                |row| snapshot_from_row(volume, row),
            )
            .optional()
            .map_err(from_rusqlite)
    }

    /// Point the head of `snapshot`'s volume at `snapshot`.
    ///
    /// # Errors
    ///
    /// `SnapshotNotFound` when the snapshot is not registered.
    pub fn set_head(&mut self, snapshot: &Snapshot) -> Result<()> {
        let tx = self.conn.transaction().map_err(from_rusqlite)?;
        let ids: Option<(i64, i64)> = tx
            .query_row(
                "SELECT v.id, s.id FROM snapshots s
                 JOIN volumes v ON v.id = s.volume_id
                 WHERE v.path = ?1 AND s.name = ?2",
                rusqlite::params![snapshot.volume().key(), snapshot.name()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(from_rusqlite)?;
        let (volume_id, snapshot_id) =
            ids.ok_or_else(|| snapshot_not_found(snapshot).with_op("set_head"))?;
        tx.execute(
            "INSERT INTO head (volume_id, head_snapshot_id) VALUES (?1, ?2)
             ON CONFLICT(volume_id) DO UPDATE SET head_snapshot_id = excluded.head_snapshot_id",
            rusqlite::params![volume_id, snapshot_id],
        )
        .map_err(from_rusqlite)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(())
    }
}

fn snapshot_not_found(snapshot: &Snapshot) -> ExError {
    SotError::SnapshotNotFound {
        volume: snapshot.volume().key(),
        name: snapshot.name().to_string(),
    }
    .into()
}

fn volume_id(conn: &Connection, volume: &Volume) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM volumes WHERE path = ?1",
        [volume.key()],
        |row| row.get(0),
    )
    .optional()
    .map_err(from_rusqlite)
}

fn register_volume(conn: &Connection, volume: &mut Volume) -> Result<i64> {
    conn.execute(
        "INSERT INTO volumes (path) VALUES (?1) ON CONFLICT(path) DO NOTHING",
        [volume.key()],
    )
    .map_err(from_rusqlite)?;
    let id = volume_id(conn, volume)?.ok_or_else(|| {
        ExError::new(ExErrorKind::Internal)
            .with_op("register_volume")
            .with_volume(volume.key())
            .with_message("volume row missing after insert")
    })?;
    volume.set_state(VolumeState::Registered { id });
    Ok(id)
}

fn register_snapshot(conn: &Connection, snapshot: &mut Snapshot) -> Result<i64> {
    let volume_id = register_volume(conn, snapshot.volume_mut())?;
    let id: i64 = conn
        .query_row(
            "INSERT INTO snapshots (volume_id, name, time, annotation) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(volume_id, name) DO UPDATE SET
                time = excluded.time,
                annotation = excluded.annotation
             RETURNING id",
            rusqlite::params![
                volume_id,
                snapshot.name(),
                to_epoch_seconds(snapshot.time()),
                snapshot.annotation(),
            ],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)?;
    snapshot.hydrate(SnapshotRecord {
        id,
        time: snapshot.time(),
        annotation: snapshot.annotation().map(str::to_string),
    });
    Ok(id)
}
