//! Error types for scanning and comparison.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a comparison.
///
/// Problems with individual entries below a root never surface here; they
/// are recorded as [`ScanWarning`]s and unreadable entries instead.
#[derive(Debug, Error)]
pub enum CompareError {
    /// Root path does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Permission denied on a root path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// I/O error on a root path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid exclusion pattern.
    #[error("Invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CompareError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether this is a path error (bad root or bad arguments) rather than
    /// a failure while reading the filesystem.
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NotADirectory { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Process exit status for this error.
    pub fn exit_status(&self) -> ExitStatus {
        if self.is_path_error() {
            ExitStatus::InvalidInput
        } else {
            ExitStatus::Fatal
        }
    }
}

/// Process exit status of a comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitStatus {
    /// Trees are identical.
    Identical,
    /// At least one difference was found.
    Differences,
    /// Invalid arguments or a missing root.
    InvalidInput,
    /// Fatal I/O error, or nothing could be compared.
    Fatal,
}

impl ExitStatus {
    /// Numeric process exit code.
    pub fn code(self) -> u8 {
        match self {
            Self::Identical => 0,
            Self::Differences => 1,
            Self::InvalidInput => 2,
            Self::Fatal => 3,
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Symbolic link target does not exist.
    BrokenSymlink,
    /// Followed symlink leads back to one of its own ancestors.
    SymlinkCycle,
    /// Error reading a directory listing.
    ReadError,
    /// Error reading metadata.
    MetadataError,
}

/// Non-fatal problem encountered while scanning a single entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning from an I/O error, classifying permission problems.
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error, kind: WarningKind) -> Self {
        let kind = if error.kind() == std::io::ErrorKind::PermissionDenied {
            WarningKind::PermissionDenied
        } else {
            kind
        };
        Self::new(path, error.to_string(), kind)
    }

    /// Create a broken symlink warning.
    pub fn broken_symlink(path: impl Into<PathBuf>, target: &str) -> Self {
        let path = path.into();
        Self {
            message: format!("Broken symlink: {} -> {target}", path.display()),
            path,
            kind: WarningKind::BrokenSymlink,
        }
    }

    /// Create a symlink cycle warning.
    pub fn symlink_cycle(path: impl Into<PathBuf>, target: &str) -> Self {
        let path = path.into();
        Self {
            message: format!("Symlink cycle: {} -> {target}", path.display()),
            path,
            kind: WarningKind::SymlinkCycle,
        }
    }
}
