use sot_core::errors::{Result, SotError};
use sot_core::model::Volume;
use sot_core::subvolume::{PlainDriver, SubvolumeDriver};
use sot_engine::commands::init::init;
use sot_engine::Session;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// An initialised tracked root with a live `home` volume
pub struct Fixture {
    pub temp: TempDir,
    pub session: Session,
}

impl Fixture {
    #[allow(dead_code)]
    pub fn root(&self) -> PathBuf {
        self.temp.path().canonicalize().unwrap()
    }

    /// Absolute path of a volume's live subvolume
    #[allow(dead_code)]
    pub fn live(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    #[allow(dead_code)]
    pub fn volume(&self, relative: &str) -> Volume {
        self.session.volume(self.live(relative)).unwrap()
    }
}

#[allow(dead_code)]
pub fn fixture() -> Fixture {
    fixture_with_driver(Box::new(PlainDriver))
}

pub fn fixture_with_driver(driver: Box<dyn SubvolumeDriver>) -> Fixture {
    let temp = TempDir::new().unwrap();
    init(temp.path(), false).unwrap();
    write_live(&temp.path().join("home"), "version 1");
    let session = Session::open(Some(temp.path()), driver).unwrap();
    Fixture { temp, session }
}

/// (Re)populate a live directory with a single `data.txt`
pub fn write_live(dir: &Path, contents: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("data.txt"), contents).unwrap();
}

#[allow(dead_code)]
pub fn read_data(dir: &Path) -> String {
    fs::read_to_string(dir.join("data.txt")).unwrap()
}

#[allow(dead_code)]
pub fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

/// Which primitive a [`FailingDriver`] refuses
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Nothing,
    CreateSnapshot,
    SetReadOnly,
    /// Only `set_read_only(.., true)`
    Relock,
    DeleteSubvolume,
    Rename,
}

/// Plain driver that fails one primitive with EIO once armed through the
/// shared switch returned by [`FailingDriver::new`].
#[allow(dead_code)]
pub struct FailingDriver {
    inner: PlainDriver,
    fail_on: Rc<Cell<FailOn>>,
}

#[allow(dead_code)]
impl FailingDriver {
    pub fn new() -> (Self, Rc<Cell<FailOn>>) {
        let fail_on = Rc::new(Cell::new(FailOn::Nothing));
        let driver = Self {
            inner: PlainDriver,
            fail_on: fail_on.clone(),
        };
        (driver, fail_on)
    }

    fn check(&self, op: FailOn, path: &Path) -> Result<()> {
        if self.fail_on.get() == op {
            return Err(SotError::Physical {
                op: format!("{:?}", op),
                path: path.to_path_buf(),
                code: Some(5),
                message: "injected failure".into(),
            });
        }
        Ok(())
    }
}

impl SubvolumeDriver for FailingDriver {
    fn create_snapshot(&self, source: &Path, dest: &Path, readonly: bool) -> Result<()> {
        self.check(FailOn::CreateSnapshot, dest)?;
        self.inner.create_snapshot(source, dest, readonly)
    }

    fn set_read_only(&self, path: &Path, readonly: bool) -> Result<()> {
        self.check(FailOn::SetReadOnly, path)?;
        if readonly {
            self.check(FailOn::Relock, path)?;
        }
        self.inner.set_read_only(path, readonly)
    }

    fn delete_subvolume(&self, path: &Path) -> Result<()> {
        self.check(FailOn::DeleteSubvolume, path)?;
        self.inner.delete_subvolume(path)
    }

    fn is_subvolume(&self, path: &Path) -> bool {
        self.inner.is_subvolume(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.check(FailOn::Rename, from)?;
        self.inner.rename(from, to)
    }
}
