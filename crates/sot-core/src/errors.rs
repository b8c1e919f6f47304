use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using SotError
pub type Result<T> = std::result::Result<T, SotError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// surfaced by sot. Each kind maps to a stable error code that can be used
/// for programmatic error handling, testing, and scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Volume/Snapshot domain
    NotASubvolume,
    SubvolumeNotFound,
    SnapshotNotFound,
    SnapshotExists,
    NoSnapshots,
    /// Storage removal was requested for to drop a volume that still has snapshots
    VolumeNotEmpty,

    // Storage
    NoStorage,
    AlreadyInitialized,

    // Structural/Validation
    InvalidInput,

    // Integration/IO
    /// The filesystem primitive (snapshot, delete, read-only toggle) failed
    Physical,
    Io,
    Persistence,
    /// The external annotation editor could not be run or exited non-zero
    Editor,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotASubvolume => "ERR_NOT_A_SUBVOLUME",
            ExErrorKind::SubvolumeNotFound => "ERR_SUBVOLUME_NOT_FOUND",
            ExErrorKind::SnapshotNotFound => "ERR_SNAPSHOT_NOT_FOUND",
            ExErrorKind::SnapshotExists => "ERR_SNAPSHOT_EXISTS",
            ExErrorKind::NoSnapshots => "ERR_NO_SNAPSHOTS",
            ExErrorKind::VolumeNotEmpty => "ERR_VOLUME_NOT_EMPTY",
            ExErrorKind::NoStorage => "ERR_NO_STORAGE",
            ExErrorKind::AlreadyInitialized => "ERR_ALREADY_INITIALIZED",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Physical => "ERR_PHYSICAL",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Editor => "ERR_EDITOR",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// This error type provides a structured representation of errors with
/// classification fields for programmatic handling and rich context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    volume: Option<String>,
    snapshot: Option<String>,
    path: Option<PathBuf>,
    os_code: Option<i32>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            volume: None,
            snapshot: None,
            path: None,
            os_code: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add volume context (the volume's path relative to the tracked root)
    pub fn with_volume(mut self, volume: impl Into<String>) -> Self {
        self.volume = Some(volume.into());
        self
    }

    /// Add snapshot name context
    pub fn with_snapshot(mut self, name: impl Into<String>) -> Self {
        self.snapshot = Some(name.into());
        self
    }

    /// Add filesystem path context
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add the OS error code reported by the physical layer
    pub fn with_os_code(mut self, code: i32) -> Self {
        self.os_code = Some(code);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the volume context, if any
    pub fn volume(&self) -> Option<&str> {
        self.volume.as_deref()
    }

    /// Get the snapshot context, if any
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Get the path context, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// Get the OS error code, if any
    pub fn os_code(&self) -> Option<i32> {
        self.os_code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(volume) = &self.volume {
            write!(f, " (volume: {})", volume)?;
        }
        if let Some(snapshot) = &self.snapshot {
            write!(f, " (snapshot: {})", snapshot)?;
        }
        if let Some(code) = self.os_code {
            write!(f, " (os error {})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for the path, layout, model and driver layers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SotError {
    /// The path exists but is not a subvolume of the supported filesystem
    #[error("'{}' is not a btrfs subvolume.", path.display())]
    NotASubvolume { path: PathBuf },

    /// Nothing exists at the volume's live path
    #[error("Subvolume '{}' not found.", path.display())]
    SubvolumeNotFound { path: PathBuf },

    #[error("Snapshot '{name}' not found.")]
    SnapshotNotFound { volume: String, name: String },

    #[error("Snapshot '{name}' exists.")]
    SnapshotExists { volume: String, name: String },

    #[error("'{volume}' does not have snapshots.")]
    NoSnapshots { volume: String },

    /// No `.sot` marker directory between the start directory and `/`
    #[error("No snapshot storage found above '{}'.", start.display())]
    NoStorage { start: PathBuf },

    /// A filesystem primitive failed; `code` is the OS errno or tool exit status
    #[error("{op} failed for '{}': {message}", path.display())]
    Physical {
        op: String,
        path: PathBuf,
        code: Option<i32>,
        message: String,
    },

    #[error("'{}' is outside the tracked root '{}'.", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("'{path}' is not a usable volume path.")]
    InvalidVolumePath { path: String },
}

impl SotError {
    /// Wrap an `io::Error` raised by a physical primitive
    pub fn physical(op: &str, path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        SotError::Physical {
            op: op.to_string(),
            path: path.into(),
            code: err.raw_os_error(),
            message: os_message(err),
        }
    }
}

/// Text of an `io::Error` without the ` (os error N)` suffix, which
/// [`ExError`] renders from its own OS code
pub fn os_message(err: &std::io::Error) -> String {
    let text = err.to_string();
    match err.raw_os_error() {
        Some(code) => text
            .strip_suffix(&format!(" (os error {})", code))
            .map(str::to_string)
            .unwrap_or(text),
        None => text,
    }
}

/// Conversion from SotError to ExError
impl From<SotError> for ExError {
    fn from(err: SotError) -> Self {
        let message = err.to_string();
        match err {
            SotError::NotASubvolume { path } => ExError::new(ExErrorKind::NotASubvolume)
                .with_path(path)
                .with_message(message),

            SotError::SubvolumeNotFound { path } => {
                ExError::new(ExErrorKind::SubvolumeNotFound)
                    .with_path(path)
                    .with_message(message)
            }

            SotError::SnapshotNotFound { volume, name } => {
                ExError::new(ExErrorKind::SnapshotNotFound)
                    .with_volume(volume)
                    .with_snapshot(name)
                    .with_message(message)
            }

            SotError::SnapshotExists { volume, name } => ExError::new(ExErrorKind::SnapshotExists)
                .with_volume(volume)
                .with_snapshot(name)
                .with_message(message),

            SotError::NoSnapshots { volume } => ExError::new(ExErrorKind::NoSnapshots)
                .with_volume(volume)
                .with_message(message),

            SotError::NoStorage { start } => ExError::new(ExErrorKind::NoStorage)
                .with_path(start)
                .with_message(message),

            SotError::Physical { op, path, code, .. } => {
                let err = ExError::new(ExErrorKind::Physical)
                    .with_op(op)
                    .with_path(path)
                    .with_message(message);
                match code {
                    Some(code) => err.with_os_code(code),
                    None => err,
                }
            }

            SotError::OutsideRoot { path, .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_path(path)
                .with_message(message),

            SotError::InvalidVolumePath { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
        }
    }
}
