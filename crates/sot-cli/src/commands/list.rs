//! List command
//!
//! Usage: sot list [VOLUME] [--volume-only] [--json]

use crate::config::GlobalArgs;
use clap::Args;
use sot_engine::commands::listing::{list, VolumeEntry};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only this volume (default: every tracked volume)
    pub volume: Option<PathBuf>,

    /// Print volume paths only
    #[arg(long)]
    pub volume_only: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn execute(global: &GlobalArgs, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = global.open_session()?;
    let volume = args.volume.as_ref().map(|p| session.volume(p)).transpose()?;
    let entries = list(&session, volume.as_ref())?;
    session.close()?;

    if args.json {
        if args.volume_only {
            let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
            println!("{}", serde_json::to_string_pretty(&paths)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        return Ok(());
    }

    if volume.is_none() && !args.volume_only {
        println!("Listing all snapshots...");
    }
    for entry in &entries {
        print_volume(entry, args.volume_only);
    }
    Ok(())
}

fn print_volume(entry: &VolumeEntry, volume_only: bool) {
    println!("{}", entry.path);
    if volume_only {
        return;
    }
    let width = entry
        .snapshots
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0);
    for snapshot in &entry.snapshots {
        let mut line = format!("  {:<width$}  {}", snapshot.name, snapshot.time);
        if snapshot.head {
            line.push_str("  *head");
        }
        if let Some(annotation) = &snapshot.annotation {
            line.push_str("  ");
            line.push_str(annotation.lines().next().unwrap_or_default());
        }
        println!("{}", line);
    }
}
