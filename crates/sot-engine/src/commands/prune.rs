//! Bulk snapshot deletion.
//!
//! Selects snapshots by name, by count (keep the newest N), by age or all
//! of them, then deletes them one at a time. A failure on one snapshot is
//! recorded and the batch moves on. When the volume has no snapshots left
//! its storage directory is removed and the volume unregistered.

#![allow(clippy::result_large_err)]

use super::snapshot::{delete, find};
use super::volume::{elapsed_ms, remove_storage};
use crate::session::Session;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sot_core::errors::{ExError, ExErrorKind};
use sot_core::layout::DATETIME_FORMAT;
use sot_core::model::{SnapshotMap, Volume};
use sot_core::{log_op_end, log_op_error, log_op_start};
use sot_store::errors::Result;
use std::time::Instant;

/// Which snapshots to delete
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Exactly these names, in the order given
    Names(Vec<String>),
    /// Everything but the newest N
    Keep(usize),
    /// Snapshots created strictly before this instant
    Before(DateTime<Utc>),
    All,
}

#[derive(Debug, Clone)]
pub struct PruneOptions {
    pub selection: Selection,
    /// Report the selection without deleting anything
    pub dry_run: bool,
}

/// Per-snapshot outcome of a prune
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    pub volume: String,
    pub selected: Vec<String>,
    pub deleted: Vec<String>,
    pub failed: Vec<(String, ExError)>,
    /// The volume had no snapshots left and was unregistered
    pub storage_removed: bool,
    /// Removing the emptied storage directory failed
    pub storage_error: Option<ExError>,
    pub dry_run: bool,
}

impl PruneReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.storage_error.is_none()
    }
}

/// Parse a `--before` argument: `today`, `YYYY-MM-DD` or
/// `YYYY-MM-DDTHH:MM:SS`, all in local time.
///
/// # Errors
///
/// `InvalidInput` for anything else.
pub fn parse_before(text: &str) -> Result<DateTime<Utc>> {
    let invalid = || {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("parse_before")
            .with_message(format!(
                "'{}' is not a date (expected YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or today).",
                text
            ))
    };

    let naive = if text == "today" {
        Local::now().date_naive().and_hms_opt(0, 0, 0)
    } else if let Ok(datetime) = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT) {
        Some(datetime)
    } else {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
    .ok_or_else(invalid)?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// Names chosen by `selection`, newest first for the computed selections
pub fn select(snapshots: &SnapshotMap, selection: &Selection) -> Vec<String> {
    match selection {
        Selection::Names(names) => {
            let mut unique: Vec<String> = Vec::with_capacity(names.len());
            for name in names {
                if !unique.contains(name) {
                    unique.push(name.clone());
                }
            }
            unique
        }
        Selection::Keep(keep) => snapshots
            .iter()
            .skip(*keep)
            .map(|s| s.name().to_string())
            .collect(),
        Selection::Before(cutoff) => snapshots
            .iter()
            .filter(|s| s.time() < *cutoff)
            .map(|s| s.name().to_string())
            .collect(),
        Selection::All => snapshots.names().into_iter().map(String::from).collect(),
    }
}

/// Delete the selected snapshots of `volume`.
///
/// # Errors
///
/// `NoSnapshots` when the selection is empty. Failures of individual
/// deletions are reported in [`PruneReport::failed`] and a failed storage
/// cleanup in [`PruneReport::storage_error`] instead.
pub fn prune(session: &mut Session, volume: &mut Volume, options: PruneOptions) -> Result<PruneReport> {
    log_op_start!("volume_prune", volume = %volume, dry_run = options.dry_run);
    let start = Instant::now();

    let report = prune_impl(session, volume, options).map_err(|e| {
        log_op_error!(
            "volume_prune",
            e.clone(),
            duration_ms = elapsed_ms(start),
            volume = %volume
        );
        e
    })?;

    log_op_end!(
        "volume_prune",
        duration_ms = elapsed_ms(start),
        volume = %volume,
        snapshot_count = report.deleted.len(),
        failed = report.failed.len()
    );
    Ok(report)
}

fn prune_impl(session: &mut Session, volume: &mut Volume, options: PruneOptions) -> Result<PruneReport> {
    let snapshots = session.index().snapshots(volume)?;
    let selected = select(&snapshots, &options.selection);
    if selected.is_empty() {
        return Err(ExError::new(ExErrorKind::NoSnapshots)
            .with_op("prune")
            .with_volume(volume.key())
            .with_message("No snapshots available for deletion."));
    }

    let mut report = PruneReport {
        volume: volume.key(),
        selected,
        dry_run: options.dry_run,
        ..PruneReport::default()
    };
    if options.dry_run {
        return Ok(report);
    }

    for name in &report.selected {
        let outcome = find(session, volume, name).and_then(|mut snapshot| delete(session, &mut snapshot));
        match outcome {
            Ok(()) => report.deleted.push(name.clone()),
            Err(e) => {
                tracing::warn!(volume = %volume, snapshot = %name, error = %e, "snapshot not deleted");
                report.failed.push((name.clone(), e));
            }
        }
    }

    if session.index().snapshots(volume)?.is_empty() {
        match remove_storage(session, volume) {
            Ok(()) => report.storage_removed = true,
            Err(e) => report.storage_error = Some(e),
        }
    }
    Ok(report)
}
