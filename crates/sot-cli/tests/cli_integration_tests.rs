//! CLI integration tests
//!
//! Drive the compiled `sot` binary against a scratch root with the plain
//! directory driver, then inspect both the storage tree and the index.

use rusqlite::Connection;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn sot(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sot"))
        .current_dir(root)
        .env("SOT_DRIVER", "plain")
        .env_remove("SOT_ROOT")
        .env_remove("RUST_LOG")
        .env_remove("VISUAL")
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn ok(root: &Path, args: &[&str]) -> String {
    let output = sot(root, args);
    assert!(
        output.status.success(),
        "sot {:?} failed: {}",
        args,
        stderr(&output)
    );
    stdout(&output)
}

/// Initialised root with a live `home` volume
fn setup() -> TempDir {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("home");
    fs::create_dir(&home).unwrap();
    fs::write(home.join("data.txt"), "version 1").unwrap();
    ok(temp.path(), &["init"]);
    temp
}

fn db(root: &Path) -> Connection {
    Connection::open(root.join(".sot").join("index.db")).unwrap()
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

/// Name from "Snapshot 'home/<name>' created"
fn created_name(out: &str) -> String {
    let start = out.find("'home/").unwrap() + "'home/".len();
    let end = out[start..].find('\'').unwrap() + start;
    out[start..end].to_string()
}

fn editor_script(dir: &Path, text: &str) -> String {
    let path = dir.join("fake-editor.sh");
    fs::write(&path, format!("#!/bin/sh\nprintf '{}\\n' > \"$1\"\n", text)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_end_to_end_create_list_delete() {
    let temp = setup();
    let root = temp.path();

    let out = ok(root, &["create", "home"]);
    let name = created_name(&out);
    assert_eq!(name.len(), 8);
    assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(root.join(".sot/home").join(&name).is_dir());

    let listing = ok(root, &["list", "home"]);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines[0], "home");
    assert_eq!(lines.len(), 2);
    let fields: Vec<&str> = lines[1].split_whitespace().collect();
    assert_eq!(fields[0], name);
    assert_eq!(fields[1].len(), 19);
    assert_eq!(&fields[1][10..11], "T");
    assert_eq!(fields[2], "*head");

    let out = ok(root, &["delete", "home", "--keep", "0"]);
    assert!(out.contains(&format!("Deleted snapshot: 'home/{}'", name)));
    assert!(out.contains("Removed snapshots dir for subvolume home"));
    assert!(!root.join(".sot/home").exists());
    assert!(root.join("home/data.txt").is_file());

    let conn = db(root);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM volumes"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM snapshots"), 0);
}

#[test]
fn test_init_twice_requires_force() {
    let temp = setup();

    let output = sot(temp.path(), &["init"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("ERR_ALREADY_INITIALIZED"));

    let out = ok(temp.path(), &["init", "--force"]);
    assert!(out.starts_with("Reinitialized snapshot storage"));
}

#[test]
fn test_missing_storage_reports_error() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_string_lossy().into_owned();

    let output = sot(temp.path(), &["--root", &root, "list"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("Error: [ERR_NO_STORAGE]"));
}

#[test]
fn test_root_flag_from_elsewhere() {
    let temp = setup();
    let elsewhere = TempDir::new().unwrap();
    let root = temp.path().to_string_lossy().into_owned();

    ok(elsewhere.path(), &["--root", &root, "create", "home", "remote"]);
    assert!(temp.path().join(".sot/home/remote").is_dir());
}

#[test]
fn test_list_all_and_json() {
    let temp = setup();
    let root = temp.path();
    fs::create_dir_all(root.join("srv/www")).unwrap();
    ok(root, &["create", "home", "h1", "--annotation", "first"]);
    ok(root, &["create", "home", "h2"]);
    ok(root, &["create", "srv/www", "w1"]);

    let out = ok(root, &["list"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Listing all snapshots...");
    assert_eq!(lines[1], "home");
    assert!(lines[2].trim_start().starts_with("h2"));
    assert!(lines[2].contains("*head"));
    assert!(lines[3].trim_start().starts_with("h1"));
    assert!(lines[3].ends_with("first"));
    assert_eq!(lines[4], "srv/www");

    let out = ok(root, &["list", "--volume-only"]);
    assert_eq!(out, "home\nsrv/www\n");

    let json: serde_json::Value = serde_json::from_str(&ok(root, &["list", "--json"])).unwrap();
    assert_eq!(json[0]["path"], "home");
    assert_eq!(json[0]["snapshots"][0]["name"], "h2");
    assert_eq!(json[0]["snapshots"][1]["annotation"], "first");
    assert_eq!(json[1]["snapshots"][0]["head"], true);

    let conn = db(root);
    assert!(root.join(".sot/srv@www/w1").is_dir());
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM volumes WHERE path = 'srv/www'"),
        1
    );
}

#[test]
fn test_create_existing_name_fails() {
    let temp = setup();
    ok(temp.path(), &["create", "home", "dup"]);

    let output = sot(temp.path(), &["create", "home", "dup"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Snapshot 'dup' exists."));

    ok(temp.path(), &["create", "home", "dup", "--force"]);
}

#[test]
fn test_create_missing_volume_fails() {
    let temp = setup();
    let output = sot(temp.path(), &["create", "nothere"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("ERR_SUBVOLUME_NOT_FOUND"));
    assert_eq!(count(&db(temp.path()), "SELECT COUNT(*) FROM volumes"), 0);
}

#[test]
fn test_rename_and_path() {
    let temp = setup();
    let root = temp.path();
    ok(root, &["create", "home", "old"]);

    ok(root, &["rename", "home", "old", "new"]);

    let out = ok(root, &["path", "home", "new"]);
    let expected = root.canonicalize().unwrap().join(".sot/home/new");
    assert_eq!(out.trim_end(), expected.to_string_lossy());

    let output = sot(root, &["path", "home", "old"]);
    assert!(stderr(&output).contains("Snapshot 'old' not found."));
    assert_eq!(
        count(&db(root), "SELECT COUNT(*) FROM snapshots WHERE name = 'new'"),
        1
    );
}

#[test]
fn test_annotate_with_text_and_editor() {
    let temp = setup();
    let root = temp.path();
    ok(root, &["create", "home", "s1"]);

    ok(root, &["annotate", "home", "s1", "before upgrade"]);
    let conn = db(root);
    let annotation: Option<String> = conn
        .query_row("SELECT annotation FROM snapshots WHERE name = 's1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(annotation.as_deref(), Some("before upgrade"));

    let scratch = TempDir::new().unwrap();
    let editor = editor_script(scratch.path(), "from editor");
    let output = Command::new(env!("CARGO_BIN_EXE_sot"))
        .current_dir(root)
        .env("SOT_DRIVER", "plain")
        .env_remove("VISUAL")
        .env("EDITOR", &editor)
        .args(["annotate", "home", "s1"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let annotation: Option<String> = conn
        .query_row("SELECT annotation FROM snapshots WHERE name = 's1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(annotation.as_deref(), Some("from editor"));

    ok(root, &["annotate", "home", "s1", ""]);
    let annotation: Option<String> = conn
        .query_row("SELECT annotation FROM snapshots WHERE name = 's1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(annotation, None);
}

#[test]
fn test_create_with_edited_annotation() {
    let temp = setup();
    let scratch = TempDir::new().unwrap();
    let editor = editor_script(scratch.path(), "written in editor");

    let output = Command::new(env!("CARGO_BIN_EXE_sot"))
        .current_dir(temp.path())
        .env("SOT_DRIVER", "plain")
        .env("VISUAL", &editor)
        .args(["create", "home", "e1", "--edit-annotation"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let json: serde_json::Value =
        serde_json::from_str(&ok(temp.path(), &["list", "home", "--json"])).unwrap();
    assert_eq!(json[0]["snapshots"][0]["annotation"], "written in editor");
}

#[test]
fn test_delete_dry_run_and_partial_failure() {
    let temp = setup();
    let root = temp.path();
    ok(root, &["create", "home", "a"]);
    ok(root, &["create", "home", "b"]);

    let out = ok(root, &["delete", "home", "--all", "--dry-run"]);
    assert!(out.starts_with("Dry run, no snapshots will be deleted..."));
    assert!(root.join(".sot/home/a").is_dir());

    let output = sot(root, &["delete", "home", "ghost", "a"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Deleted snapshot: 'home/a'"));
    assert!(stderr(&output).contains("Could not delete 'home/ghost'"));
    assert!(!root.join(".sot/home/a").exists());
    assert!(root.join(".sot/home/b").is_dir());
}

#[test]
fn test_delete_all_reports_deletions_when_storage_cleanup_fails() {
    let temp = setup();
    let root = temp.path();
    ok(root, &["create", "home", "a"]);
    std::fs::create_dir(root.join(".sot/home/stray")).unwrap();

    let output = sot(root, &["delete", "home", "--all"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Deleted snapshot: 'home/a'"));
    assert!(stderr(&output).contains("Could not remove snapshots dir for subvolume home"));
    assert!(!root.join(".sot/home/a").exists());
}

#[test]
fn test_delete_needs_a_selection() {
    let temp = setup();
    ok(temp.path(), &["create", "home", "a"]);

    let output = sot(temp.path(), &["delete", "home"]);
    assert!(!output.status.success());

    let output = sot(temp.path(), &["delete", "home", "--keep", "5"]);
    assert!(stderr(&output).contains("No snapshots available for deletion."));
}

#[test]
fn test_delete_before_today() {
    let temp = setup();
    ok(temp.path(), &["create", "home", "fresh"]);

    let output = sot(temp.path(), &["delete", "home", "--before", "today"]);
    assert!(!output.status.success());
    assert!(temp.path().join(".sot/home/fresh").is_dir());

    let output = sot(temp.path(), &["delete", "home", "--before", "not-a-date"]);
    assert!(stderr(&output).contains("ERR_INVALID_INPUT"));
}

#[test]
fn test_load_copy() {
    let temp = setup();
    let root = temp.path();
    ok(root, &["create", "home", "s1"]);

    ok(root, &["load", "home", "s1", "restored"]);
    assert_eq!(
        fs::read_to_string(root.join("restored/data.txt")).unwrap(),
        "version 1"
    );

    let output = sot(root, &["load", "home", "s1", "restored"]);
    assert!(!output.status.success());
}

#[test]
fn test_rm_then_switch_restores() {
    let temp = setup();
    let root = temp.path();
    ok(root, &["create", "home", "s1"]);
    fs::write(root.join("home/data.txt"), "version 2").unwrap();
    ok(root, &["create", "home", "s2"]);

    ok(root, &["rm", "home"]);
    assert!(!root.join("home").exists());

    let out = ok(root, &["switch", "home", "s1"]);
    assert_eq!(out.trim_end(), "Switched 'home' to snapshot 's1'");
    assert_eq!(
        fs::read_to_string(root.join("home/data.txt")).unwrap(),
        "version 1"
    );

    let conn = db(root);
    let head: String = conn
        .query_row(
            "SELECT s.name FROM head h JOIN snapshots s ON s.id = h.head_snapshot_id",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(head, "s1");
}

#[test]
fn test_rebuild_db_prints_counts() {
    let temp = setup();
    let root = temp.path();
    ok(root, &["create", "home", "s1"]);
    ok(root, &["create", "home", "s2"]);
    fs::create_dir_all(root.join(".sot/srv@www/w1")).unwrap();

    let out = ok(root, &["rebuild-db"]);
    assert_eq!(out.trim_end(), "Index rebuilt: 2 volumes, 3 snapshots");

    let conn = db(root);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM volumes WHERE path = 'srv/www'"),
        1
    );
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM head"), 0);
}

#[test]
fn test_dot_slash_volume_after_rm() {
    let temp = setup();
    let root = temp.path();
    ok(root, &["create", "./home", "s1"]);

    ok(root, &["rm", "./home"]);
    assert!(!root.join("home").exists());

    let out = ok(root, &["switch", "./home"]);
    assert_eq!(out.trim_end(), "Switched 'home' to snapshot 's1'");
    assert!(root.join("home/data.txt").is_file());
}
