//! Read-side views for `list`

#![allow(clippy::result_large_err)]

use crate::session::Session;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sot_core::model::Volume;
use sot_store::errors::Result;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub name: String,
    /// Local time, `%Y-%m-%dT%H:%M:%S`
    pub time: String,
    pub created_at: DateTime<Utc>,
    pub head: bool,
    pub annotation: Option<String>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeEntry {
    pub path: String,
    pub snapshots: Vec<SnapshotEntry>,
}

/// One volume with its snapshots, newest first
pub fn describe(session: &Session, volume: &Volume) -> Result<VolumeEntry> {
    let head_id = session.index().head(volume)?.and_then(|h| h.id());
    let snapshots = session
        .index()
        .snapshots(volume)?
        .iter()
        .map(|s| SnapshotEntry {
            name: s.name().to_string(),
            time: s.strtime(),
            created_at: s.time(),
            head: head_id.is_some() && s.id() == head_id,
            annotation: s.annotation().map(str::to_string),
            path: s.path().to_path_buf(),
        })
        .collect();
    Ok(VolumeEntry {
        path: volume.key(),
        snapshots,
    })
}

/// Every tracked volume (ordered by path), or just `volume`
pub fn list(session: &Session, volume: Option<&Volume>) -> Result<Vec<VolumeEntry>> {
    match volume {
        Some(volume) => Ok(vec![describe(session, volume)?]),
        None => session
            .index()
            .volumes()?
            .iter()
            .map(|v| describe(session, v))
            .collect(),
    }
}
