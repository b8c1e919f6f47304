//! Snapshot entity and the per-volume snapshot mapping

use super::volume::Volume;
use crate::layout::DATETIME_FORMAT;
use chrono::{DateTime, Local, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Index-side attributes of a registered snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub id: i64,
    pub time: DateTime<Utc>,
    pub annotation: Option<String>,
}

/// Whether the index knows this snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotState {
    Unregistered,
    Registered(SnapshotRecord),
}

/// One named copy of a volume, stored at `<volume storage>/<name>`
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    volume: Volume,
    name: String,
    path: PathBuf,
    readonly: bool,
    time: DateTime<Utc>,
    annotation: Option<String>,
    state: SnapshotState,
}

impl Snapshot {
    /// A not-yet-registered snapshot of `volume`; `time` defaults to now
    pub fn new(volume: &Volume, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: volume.storage_dir().join(&name),
            volume: volume.clone(),
            name,
            readonly: true,
            time: Utc::now(),
            annotation: None,
            state: SnapshotState::Unregistered,
        }
    }

    /// A snapshot with a freshly generated name whose storage path is free
    pub fn generated(volume: &Volume) -> Self {
        loop {
            let candidate = Self::new(volume, generate_name());
            if !candidate.path.exists() {
                return candidate;
            }
        }
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn volume_mut(&mut self) -> &mut Volume {
        &mut self.volume
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage location (`<volume storage>/<name>`)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mirrors the physical read-only flag; false only while being renamed
    pub fn readonly(&self) -> bool {
        self.readonly
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn state(&self) -> &SnapshotState {
        &self.state
    }

    /// Index id, when registered
    pub fn id(&self) -> Option<i64> {
        match &self.state {
            SnapshotState::Registered(record) => Some(record.id),
            SnapshotState::Unregistered => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.state, SnapshotState::Registered(_))
    }

    /// Local-time rendering of the creation time
    pub fn strtime(&self) -> String {
        self.time
            .with_timezone(&Local)
            .format(DATETIME_FORMAT)
            .to_string()
    }

    /// Record hydrated or freshly inserted index attributes
    pub fn hydrate(&mut self, record: SnapshotRecord) {
        self.time = record.time;
        self.annotation = record.annotation.clone();
        self.state = SnapshotState::Registered(record);
    }

    /// Forget the index attributes (after unregistering)
    pub fn unregistered(&mut self) {
        self.state = SnapshotState::Unregistered;
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.time = time;
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    /// Change the name and storage path without touching disk or index
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.path = self.volume.storage_dir().join(&self.name);
    }

    /// Change the in-memory annotation; a registered record follows along
    pub fn set_annotation(&mut self, annotation: Option<String>) {
        if let SnapshotState::Registered(record) = &mut self.state {
            record.annotation = annotation.clone();
        }
        self.annotation = annotation;
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.volume, self.name)
    }
}

/// Short random snapshot name: the first 8 hex digits of SHA-256 over 16
/// random bytes.
pub fn generate_name() -> String {
    let seed: [u8; 16] = rand::random();
    let digest = Sha256::digest(seed);
    hex::encode(&digest[..4])
}

/// A volume's snapshots keyed by name, ordered newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotMap {
    entries: Vec<Snapshot>,
}

impl SnapshotMap {
    /// Wrap snapshots that are already ordered newest first
    pub fn from_ordered(entries: Vec<Snapshot>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Snapshot> {
        self.entries.iter().find(|s| s.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent snapshot
    pub fn newest(&self) -> Option<&Snapshot> {
        self.entries.first()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(Snapshot::name).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Snapshot> {
        self.entries
    }
}

impl IntoIterator for SnapshotMap {
    type Item = Snapshot;
    type IntoIter = std::vec::IntoIter<Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a SnapshotMap {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::StorageLayout;
    use tempfile::TempDir;

    fn volume(temp: &TempDir) -> Volume {
        Volume::new(&StorageLayout::new(temp.path()), "srv/www")
    }

    #[test]
    fn test_generate_name_is_eight_hex_chars() {
        for _ in 0..32 {
            let name = generate_name();
            assert_eq!(name.len(), 8);
            assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_generated_avoids_existing_paths() {
        let temp = TempDir::new().unwrap();
        let volume = volume(&temp);
        std::fs::create_dir_all(volume.storage_dir()).unwrap();

        let snapshot = Snapshot::generated(&volume);
        assert!(!snapshot.path().exists());
        assert_eq!(snapshot.path().parent(), Some(volume.storage_dir()));
    }

    #[test]
    fn test_set_name_moves_path() {
        let temp = TempDir::new().unwrap();
        let volume = volume(&temp);
        let mut snapshot = Snapshot::new(&volume, "before");
        snapshot.set_name("after");
        assert_eq!(snapshot.path(), volume.storage_dir().join("after"));
        assert_eq!(snapshot.to_string(), "srv/www/after");
    }

    #[test]
    fn test_hydrate_and_annotation_follow_record() {
        let temp = TempDir::new().unwrap();
        let mut snapshot = Snapshot::new(&volume(&temp), "nightly");
        assert_eq!(snapshot.id(), None);

        snapshot.hydrate(SnapshotRecord {
            id: 7,
            time: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            annotation: Some("before upgrade".into()),
        });
        assert_eq!(snapshot.id(), Some(7));
        assert_eq!(snapshot.annotation(), Some("before upgrade"));

        snapshot.set_annotation(None);
        match snapshot.state() {
            SnapshotState::Registered(record) => assert_eq!(record.annotation, None),
            SnapshotState::Unregistered => panic!("still registered"),
        }
    }

    #[test]
    fn test_map_lookup_and_order() {
        let temp = TempDir::new().unwrap();
        let volume = volume(&temp);
        let map = SnapshotMap::from_ordered(vec![
            Snapshot::new(&volume, "newest"),
            Snapshot::new(&volume, "oldest"),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.newest().map(Snapshot::name), Some("newest"));
        assert!(map.contains("oldest"));
        assert!(map.get("missing").is_none());
        assert_eq!(map.names(), vec!["newest", "oldest"]);
    }
}
