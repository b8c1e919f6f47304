//! sot CLI
//!
//! Command-line interface for managing snapshots of copy-on-write subvolumes

use clap::{Parser, Subcommand};
use sot_core::logging_facility;

mod commands;
mod config;
mod editor;

#[derive(Debug, Parser)]
#[command(name = "sot")]
#[command(about = "sot - snapshots of btrfs subvolumes", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: config::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Initialize snapshot storage at the root
    Init(commands::init::InitArgs),
    /// Create a new snapshot of a volume
    Create(commands::snapshot::CreateArgs),
    /// List snapshots of one or all volumes
    List(commands::list::ListArgs),
    /// Rename a snapshot
    Rename(commands::snapshot::RenameArgs),
    /// Delete snapshots
    Delete(commands::delete::DeleteArgs),
    /// Print the storage path of a snapshot
    Path(commands::snapshot::PathArgs),
    /// Set or edit the annotation of a snapshot
    Annotate(commands::snapshot::AnnotateArgs),
    /// Make a writable copy of a snapshot somewhere else
    Load(commands::snapshot::LoadArgs),
    /// Replace the live volume with a snapshot
    Switch(commands::volume::SwitchArgs),
    /// Delete the live volume, keeping its snapshots
    Rm(commands::volume::RmArgs),
    /// Rebuild the index from the storage directory
    #[command(name = "rebuild-db")]
    RebuildDb,
}

fn main() {
    let cli = Cli::parse();
    logging_facility::init(cli.global.profile(), cli.global.verbose);

    let global = &cli.global;
    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(global, args),
        Commands::Create(args) => commands::snapshot::execute_create(global, args),
        Commands::List(args) => commands::list::execute(global, args),
        Commands::Rename(args) => commands::snapshot::execute_rename(global, args),
        Commands::Delete(args) => commands::delete::execute(global, args),
        Commands::Path(args) => commands::snapshot::execute_path(global, args),
        Commands::Annotate(args) => commands::snapshot::execute_annotate(global, args),
        Commands::Load(args) => commands::snapshot::execute_load(global, args),
        Commands::Switch(args) => commands::volume::execute_switch(global, args),
        Commands::Rm(args) => commands::volume::execute_rm(global, args),
        Commands::RebuildDb => commands::init::execute_rebuild(global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
