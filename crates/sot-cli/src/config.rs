//! Global options shared by every subcommand
//!
//! Each flag falls back to an environment variable, then to a default.

use clap::Args;
use sot_core::logging_facility::Profile;
use sot_core::subvolume::DriverKind;
use sot_engine::Session;
use sot_store::errors::Result;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Tracked root (default: nearest directory above the current one that holds `.sot`)
    #[arg(short, long, global = true, env = "SOT_ROOT")]
    pub root: Option<PathBuf>,

    /// Snapshot primitives: `btrfs`, or `plain` for ordinary directories
    #[arg(
        long,
        global = true,
        env = "SOT_DRIVER",
        default_value = "btrfs",
        value_parser = ["btrfs", "plain"]
    )]
    pub driver: String,

    /// Log output format on stderr
    #[arg(
        long,
        global = true,
        env = "SOT_LOG_FORMAT",
        default_value = "pretty",
        value_parser = ["pretty", "json"]
    )]
    pub log_format: String,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn profile(&self) -> Profile {
        Profile::from_format(&self.log_format).unwrap_or(Profile::Development)
    }

    pub fn driver_kind(&self) -> DriverKind {
        DriverKind::parse(&self.driver).unwrap_or(DriverKind::Btrfs)
    }

    /// Open the index of the configured (or discovered) root
    pub fn open_session(&self) -> Result<Session> {
        Session::open(self.root.as_deref(), self.driver_kind().driver())
    }

    /// Root for `init`: the configured root, else the current directory
    pub fn init_root(&self) -> std::io::Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir(),
        }
    }
}
