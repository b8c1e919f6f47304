//! Storage initialisation and index rebuild
//!
//! Usage: sot init [--force]
//!        sot rebuild-db

use crate::config::GlobalArgs;
use clap::Args;
use sot_engine::commands::init::{init, rebuild};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Re-index existing storage instead of failing
    #[arg(short, long)]
    pub force: bool,
}

pub fn execute(global: &GlobalArgs, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let root = global.init_root()?;
    let report = init(&root, args.force)?;

    match report.rebuilt {
        Some(counts) => println!(
            "Reinitialized snapshot storage in {} ({} volumes, {} snapshots)",
            report.root.display(),
            counts.volumes,
            counts.snapshots
        ),
        None => println!("Initialized snapshot storage in {}", report.root.display()),
    }
    Ok(())
}

pub fn execute_rebuild(global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = global.open_session()?;
    let report = rebuild(&mut session)?;
    session.close()?;

    println!(
        "Index rebuilt: {} volumes, {} snapshots",
        report.volumes, report.snapshots
    );
    Ok(())
}
