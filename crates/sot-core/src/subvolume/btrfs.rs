use super::SubvolumeDriver;
use crate::errors::{Result, SotError};
use std::ffi::OsStr;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Inode number of every btrfs subvolume root (BTRFS_FIRST_FREE_OBJECTID)
const SUBVOLUME_ROOT_INODE: u64 = 256;

/// Driver backed by the `btrfs` command-line tool
#[derive(Debug, Clone)]
pub struct BtrfsDriver {
    program: PathBuf,
}

impl Default for BtrfsDriver {
    fn default() -> Self {
        Self {
            program: PathBuf::from("btrfs"),
        }
    }
}

impl BtrfsDriver {
    /// Use a specific `btrfs` executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, op: &str, path: &Path, args: &[&OsStr]) -> Result<()> {
        tracing::debug!(op, path = %path.display(), "invoking btrfs");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| SotError::physical(op, path, &e))?;
        if output.status.success() {
            return Ok(());
        }
        Err(SotError::Physical {
            op: op.to_string(),
            path: path.to_path_buf(),
            code: output.status.code(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl SubvolumeDriver for BtrfsDriver {
    fn create_snapshot(&self, source: &Path, dest: &Path, readonly: bool) -> Result<()> {
        if dest.exists() {
            return Err(SotError::Physical {
                op: "create_snapshot".into(),
                path: dest.to_path_buf(),
                code: None,
                message: "destination exists".into(),
            });
        }
        if !self.is_subvolume(source) {
            return Err(SotError::NotASubvolume {
                path: source.to_path_buf(),
            });
        }
        let mut args = vec![OsStr::new("subvolume"), OsStr::new("snapshot")];
        if readonly {
            args.push(OsStr::new("-r"));
        }
        args.push(source.as_os_str());
        args.push(dest.as_os_str());
        self.run("create_snapshot", dest, &args)
    }

    fn set_read_only(&self, path: &Path, readonly: bool) -> Result<()> {
        let value = if readonly { "true" } else { "false" };
        self.run(
            "set_read_only",
            path,
            &[
                OsStr::new("property"),
                OsStr::new("set"),
                OsStr::new("-ts"),
                path.as_os_str(),
                OsStr::new("ro"),
                OsStr::new(value),
            ],
        )
    }

    fn delete_subvolume(&self, path: &Path) -> Result<()> {
        self.run(
            "delete_subvolume",
            path,
            &[OsStr::new("subvolume"), OsStr::new("delete"), path.as_os_str()],
        )
    }

    fn is_subvolume(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path)
            .map(|meta| meta.is_dir() && meta.ino() == SUBVOLUME_ROOT_INODE)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_path_is_not_a_subvolume() {
        let temp = TempDir::new().unwrap();
        assert!(!BtrfsDriver::default().is_subvolume(&temp.path().join("missing")));
    }

    #[test]
    fn test_create_refuses_existing_destination() {
        let temp = TempDir::new().unwrap();
        let driver = BtrfsDriver::with_program("/nonexistent/btrfs");
        let err = driver
            .create_snapshot(temp.path(), temp.path(), true)
            .unwrap_err();
        assert!(matches!(err, SotError::Physical { .. }));
    }

    #[test]
    fn test_missing_tool_reports_os_error() {
        let temp = TempDir::new().unwrap();
        let driver = BtrfsDriver::with_program("/nonexistent/btrfs");
        match driver.delete_subvolume(temp.path()).unwrap_err() {
            SotError::Physical { code, op, .. } => {
                assert_eq!(op, "delete_subvolume");
                assert!(code.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
