use super::SubvolumeDriver;
use crate::errors::{Result, SotError};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

const READ_ONLY_MODE: u32 = 0o555;
const WRITABLE_MODE: u32 = 0o755;

/// Directory-tree driver: any directory is a subvolume and a snapshot is a
/// full recursive copy. Read-only is the permission bits of the top
/// directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDriver;

fn copy_tree(source: &Path, dest: &Path) -> std::io::Result<()> {
    fs::create_dir(dest)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        let kind = entry.file_type()?;
        if kind.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else if kind.is_symlink() {
            std::os::unix::fs::symlink(fs::read_link(entry.path())?, &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

impl SubvolumeDriver for PlainDriver {
    fn create_snapshot(&self, source: &Path, dest: &Path, readonly: bool) -> Result<()> {
        if fs::symlink_metadata(dest).is_ok() {
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
        if let Err(e) = copy_tree(source, dest) {
            // Leave nothing half-copied behind
            let _ = fs::remove_dir_all(dest);
            return Err(SotError::physical("create_snapshot", dest, &e));
        }
        self.set_read_only(dest, readonly)
    }

    fn set_read_only(&self, path: &Path, readonly: bool) -> Result<()> {
        let mode = if readonly { READ_ONLY_MODE } else { WRITABLE_MODE };
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|e| SotError::physical("set_read_only", path, &e))
    }

    fn delete_subvolume(&self, path: &Path) -> Result<()> {
        if !self.is_subvolume(path) {
            return Err(SotError::NotASubvolume {
                path: path.to_path_buf(),
            });
        }
        fs::remove_dir_all(path).map_err(|e| SotError::physical("delete_subvolume", path, &e))
    }

    fn is_subvolume(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }
}
