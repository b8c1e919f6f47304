//! Single-snapshot commands
//!
//! Usage: sot create <VOLUME> [NAME] [--force] [--annotation TEXT | --edit-annotation]
//!        sot rename <VOLUME> <SNAPSHOT> <NEW_NAME>
//!        sot path <VOLUME> <SNAPSHOT>
//!        sot annotate <VOLUME> <SNAPSHOT> [TEXT]
//!        sot load <VOLUME> <SNAPSHOT> <WORKDIR>

use crate::config::GlobalArgs;
use crate::editor;
use clap::Args;
use sot_engine::commands::snapshot::{annotate, create, find, load_to_path, rename, CreateOptions};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Live volume to snapshot
    pub volume: PathBuf,

    /// Snapshot name (default: 8 random hex digits)
    pub name: Option<String>,

    /// Replace an existing snapshot with the same name
    #[arg(short, long)]
    pub force: bool,

    /// Annotation text
    #[arg(long, conflicts_with = "edit_annotation")]
    pub annotation: Option<String>,

    /// Write the annotation in $EDITOR
    #[arg(short, long)]
    pub edit_annotation: bool,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    pub volume: PathBuf,
    pub snapshot: String,
    pub new_name: String,
}

#[derive(Debug, Args)]
pub struct PathArgs {
    pub volume: PathBuf,
    pub snapshot: String,
}

#[derive(Debug, Args)]
pub struct AnnotateArgs {
    pub volume: PathBuf,
    pub snapshot: String,

    /// New annotation (default: edit the current one in $EDITOR)
    pub text: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    pub volume: PathBuf,
    pub snapshot: String,

    /// Destination; must not exist yet
    pub workdir: PathBuf,
}

pub fn execute_create(
    global: &GlobalArgs,
    args: CreateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let annotation = if args.edit_annotation {
        Some(editor::edit("")?)
    } else {
        args.annotation
    };

    let mut session = global.open_session()?;
    let volume = session.volume(&args.volume)?;
    let options = CreateOptions {
        name: args.name,
        annotation,
        force: args.force,
    };
    let snapshot = create(&mut session, &volume, options)?;
    session.close()?;

    println!("Snapshot '{}' created", snapshot);
    Ok(())
}

pub fn execute_rename(
    global: &GlobalArgs,
    args: RenameArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = global.open_session()?;
    let volume = session.volume(&args.volume)?;
    let mut snapshot = find(&session, &volume, &args.snapshot)?;
    rename(&mut session, &mut snapshot, &args.new_name)?;
    session.close()?;

    println!("Snapshot '{}/{}' renamed to '{}'", volume, args.snapshot, snapshot.name());
    Ok(())
}

pub fn execute_path(global: &GlobalArgs, args: PathArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = global.open_session()?;
    let volume = session.volume(&args.volume)?;
    let snapshot = find(&session, &volume, &args.snapshot)?;
    session.close()?;

    println!("{}", snapshot.path().display());
    Ok(())
}

pub fn execute_annotate(
    global: &GlobalArgs,
    args: AnnotateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = global.open_session()?;
    let volume = session.volume(&args.volume)?;
    let mut snapshot = find(&session, &volume, &args.snapshot)?;

    let text = match args.text {
        Some(text) => text,
        None => editor::edit(snapshot.annotation().unwrap_or_default())?,
    };
    annotate(&mut session, &mut snapshot, Some(text))?;
    session.close()?;

    match snapshot.annotation() {
        Some(_) => println!("Annotation of '{}' updated", snapshot),
        None => println!("Annotation of '{}' cleared", snapshot),
    }
    Ok(())
}

pub fn execute_load(global: &GlobalArgs, args: LoadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = global.open_session()?;
    let volume = session.volume(&args.volume)?;
    let snapshot = find(&session, &volume, &args.snapshot)?;
    let workdir = load_to_path(&session, &snapshot, &args.workdir)?;
    session.close()?;

    println!("Snapshot '{}' loaded to {}", snapshot, workdir.display());
    Ok(())
}
