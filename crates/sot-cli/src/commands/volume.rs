//! Live-volume commands
//!
//! Usage: sot switch <VOLUME> [SNAPSHOT]
//!        sot rm <VOLUME>

use crate::config::GlobalArgs;
use clap::Args;
use sot_engine::commands::switch::switch;
use sot_engine::commands::volume::delete_live;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SwitchArgs {
    pub volume: PathBuf,

    /// Target snapshot (default: the head, else the newest snapshot)
    pub snapshot: Option<String>,
}

#[derive(Debug, Args)]
pub struct RmArgs {
    pub volume: PathBuf,
}

pub fn execute_switch(
    global: &GlobalArgs,
    args: SwitchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = global.open_session()?;
    let volume = session.volume(&args.volume)?;
    let snapshot = switch(&mut session, &volume, args.snapshot.as_deref())?;
    session.close()?;

    println!("Switched '{}' to snapshot '{}'", volume, snapshot.name());
    Ok(())
}

pub fn execute_rm(global: &GlobalArgs, args: RmArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = global.open_session()?;
    let volume = session.volume(&args.volume)?;
    delete_live(&session, &volume)?;
    session.close()?;

    println!("Removed subvolume '{}' (snapshots kept)", volume);
    Ok(())
}
