use sot_core::errors::{ExError, ExErrorKind, SotError};
use std::path::{Path, PathBuf};

#[test]
fn test_not_a_subvolume_verifiable_by_kind() {
    let err = SotError::NotASubvolume {
        path: PathBuf::from("/srv/www"),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotASubvolume);
    assert_eq!(ex_err.code(), "ERR_NOT_A_SUBVOLUME");
    assert_eq!(ex_err.path(), Some(Path::new("/srv/www")));
    assert_eq!(ex_err.message(), "'/srv/www' is not a btrfs subvolume.");
}

#[test]
fn test_subvolume_not_found_distinct_from_not_a_subvolume() {
    let ex_err: ExError = SotError::SubvolumeNotFound {
        path: PathBuf::from("/srv/gone"),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::SubvolumeNotFound);
    assert_ne!(ex_err.kind(), ExErrorKind::NotASubvolume);
    assert_eq!(ex_err.message(), "Subvolume '/srv/gone' not found.");
}

#[test]
fn test_snapshot_not_found_structured_fields() {
    let ex_err: ExError = SotError::SnapshotNotFound {
        volume: "home".to_string(),
        name: "deadbeef".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::SnapshotNotFound);
    assert_eq!(ex_err.volume(), Some("home"));
    assert_eq!(ex_err.snapshot(), Some("deadbeef"));
}

#[test]
fn test_outside_root_is_invalid_input() {
    let ex_err: ExError = SotError::OutsideRoot {
        path: PathBuf::from("/etc"),
        root: PathBuf::from("/srv"),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_physical_error_without_os_code() {
    let ex_err: ExError = SotError::Physical {
        op: "delete_subvolume".to_string(),
        path: PathBuf::from("/srv/.sot/home/a"),
        code: None,
        message: "busy".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::Physical);
    assert_eq!(ex_err.os_code(), None);
    assert!(ex_err.to_string().contains("delete_subvolume"));
}

#[test]
fn test_error_codes_are_unique() {
    let kinds = [
        ExErrorKind::NotASubvolume,
        ExErrorKind::SubvolumeNotFound,
        ExErrorKind::SnapshotNotFound,
        ExErrorKind::SnapshotExists,
        ExErrorKind::NoSnapshots,
        ExErrorKind::VolumeNotEmpty,
        ExErrorKind::NoStorage,
        ExErrorKind::AlreadyInitialized,
        ExErrorKind::InvalidInput,
        ExErrorKind::Physical,
        ExErrorKind::Io,
        ExErrorKind::Persistence,
        ExErrorKind::Editor,
        ExErrorKind::Internal,
    ];
    let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), kinds.len());
}
