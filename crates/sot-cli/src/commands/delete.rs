//! Delete command
//!
//! Usage: sot delete <VOLUME> [SNAPSHOTS...] [--keep N | --before DATE | --all] [--dry-run]

use crate::config::GlobalArgs;
use clap::Args;
use sot_engine::commands::prune::{parse_before, prune, PruneOptions, Selection};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub volume: PathBuf,

    /// Snapshots to delete by name
    #[arg(conflicts_with_all = ["keep", "before", "all"])]
    pub snapshots: Vec<String>,

    /// Print what would be done without deleting snapshots
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Number of latest snapshots to keep
    #[arg(short, long, conflicts_with_all = ["before", "all"])]
    pub keep: Option<usize>,

    /// Delete snapshots created before DATE (YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or today)
    #[arg(short, long, conflicts_with = "all")]
    pub before: Option<String>,

    /// Delete all snapshots
    #[arg(short, long)]
    pub all: bool,
}

impl DeleteArgs {
    fn selection(&self) -> Result<Selection, Box<dyn std::error::Error>> {
        if !self.snapshots.is_empty() {
            return Ok(Selection::Names(self.snapshots.clone()));
        }
        if let Some(keep) = self.keep {
            return Ok(Selection::Keep(keep));
        }
        if let Some(before) = &self.before {
            return Ok(Selection::Before(parse_before(before)?));
        }
        if self.all {
            return Ok(Selection::All);
        }
        Err("Give snapshot names or one of --keep, --before, --all.".into())
    }
}

pub fn execute(global: &GlobalArgs, args: DeleteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let selection = args.selection()?;
    let mut session = global.open_session()?;
    let mut volume = session.volume(&args.volume)?;

    let report = prune(
        &mut session,
        &mut volume,
        PruneOptions {
            selection,
            dry_run: args.dry_run,
        },
    )?;
    session.close()?;

    if report.dry_run {
        println!("Dry run, no snapshots will be deleted...");
        for name in &report.selected {
            println!("Would delete snapshot: '{}/{}'", report.volume, name);
        }
        return Ok(());
    }

    println!("Deleting snapshots...");
    for name in &report.deleted {
        println!("Deleted snapshot: '{}/{}'", report.volume, name);
    }
    for (name, err) in &report.failed {
        eprintln!("Could not delete '{}/{}': {}", report.volume, name, err);
    }
    if report.storage_removed {
        println!("Removed snapshots dir for subvolume {}", report.volume);
    }
    if let Some(err) = &report.storage_error {
        eprintln!(
            "Could not remove snapshots dir for subvolume {}: {}",
            report.volume, err
        );
    }

    if !report.failed.is_empty() {
        return Err(format!("{} snapshot(s) could not be deleted", report.failed.len()).into());
    }
    if !report.is_success() {
        return Err(format!("snapshots dir of '{}' was not removed", report.volume).into());
    }
    Ok(())
}
