// A failed physical primitive must leave the index untouched

mod common;

use common::{fixture_with_driver, read_data, FailOn, FailingDriver};
use sot_core::errors::ExErrorKind;
use sot_engine::commands::snapshot::{create, delete, find, rename, CreateOptions};
use sot_engine::commands::volume::{head, snapshots};

fn named(name: &str) -> CreateOptions {
    CreateOptions {
        name: Some(name.to_string()),
        ..CreateOptions::default()
    }
}

#[test]
fn test_failed_create_registers_nothing() {
    let (driver, fail_on) = FailingDriver::new();
    let mut fx = fixture_with_driver(Box::new(driver));
    let volume = fx.volume("home");
    create(&mut fx.session, &volume, named("good")).unwrap();

    fail_on.set(FailOn::CreateSnapshot);
    let err = create(&mut fx.session, &volume, named("bad")).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Physical);
    assert_eq!(err.os_code(), Some(5));
    assert_eq!(snapshots(&fx.session, &volume).unwrap().names(), vec!["good"]);
    assert_eq!(head(&fx.session, &volume).unwrap().unwrap().name(), "good");
}

#[test]
fn test_failed_delete_keeps_index_row() {
    let (driver, fail_on) = FailingDriver::new();
    let mut fx = fixture_with_driver(Box::new(driver));
    let volume = fx.volume("home");
    let mut snapshot = create(&mut fx.session, &volume, named("stuck")).unwrap();

    fail_on.set(FailOn::DeleteSubvolume);
    let err = delete(&mut fx.session, &mut snapshot).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Physical);
    assert!(snapshot.path().is_dir());
    assert!(find(&fx.session, &volume, "stuck").is_ok());
    assert!(head(&fx.session, &volume).unwrap().is_some());
}

#[test]
fn test_failed_read_only_toggle_aborts_delete() {
    let (driver, fail_on) = FailingDriver::new();
    let mut fx = fixture_with_driver(Box::new(driver));
    let volume = fx.volume("home");
    let mut snapshot = create(&mut fx.session, &volume, named("stuck")).unwrap();

    fail_on.set(FailOn::SetReadOnly);
    delete(&mut fx.session, &mut snapshot).unwrap_err();

    assert_eq!(read_data(snapshot.path()), "version 1");
    assert!(find(&fx.session, &volume, "stuck").is_ok());
}

#[test]
fn test_failed_rename_keeps_name() {
    let (driver, fail_on) = FailingDriver::new();
    let mut fx = fixture_with_driver(Box::new(driver));
    let volume = fx.volume("home");
    let mut snapshot = create(&mut fx.session, &volume, named("old")).unwrap();

    fail_on.set(FailOn::Rename);
    let err = rename(&mut fx.session, &mut snapshot, "new").unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Physical);
    assert_eq!(snapshot.name(), "old");
    assert!(snapshot.path().is_dir());
    assert!(!volume.storage_dir().join("new").exists());
    assert!(find(&fx.session, &volume, "old").is_ok());
    assert!(find(&fx.session, &volume, "new").is_err());
}

#[test]
fn test_failed_relock_after_rename_still_updates_index() {
    let (driver, fail_on) = FailingDriver::new();
    let mut fx = fixture_with_driver(Box::new(driver));
    let volume = fx.volume("home");
    let mut snapshot = create(&mut fx.session, &volume, named("old")).unwrap();

    fail_on.set(FailOn::Relock);
    let err = rename(&mut fx.session, &mut snapshot, "new").unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Physical);
    assert_eq!(snapshot.name(), "new");
    assert!(!snapshot.readonly());
    assert!(!volume.storage_dir().join("old").exists());
    assert!(volume.storage_dir().join("new").is_dir());
    assert_eq!(snapshots(&fx.session, &volume).unwrap().names(), vec!["new"]);
    assert!(find(&fx.session, &volume, "old").is_err());
}
