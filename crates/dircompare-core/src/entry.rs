//! Entry descriptors recorded for every path in a snapshot.

use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// BLAKE3 content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Coarse type tag of an entry, used for type-mismatch detection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Other,
    Unreadable,
}

/// What a snapshot knows about a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryDescriptor {
    /// Regular file.
    File {
        /// Size in bytes.
        size: u64,
        /// Last modification time.
        modified: SystemTime,
    },
    /// Directory. Its children are separate entries.
    Directory,
    /// Symbolic link, recorded without following it.
    Symlink {
        /// Link target as stored in the link.
        target: CompactString,
    },
    /// Sockets, FIFOs, device nodes.
    Other,
    /// Metadata or directory listing could not be read.
    Unreadable {
        /// Error that prevented reading the entry.
        message: CompactString,
    },
}

impl EntryDescriptor {
    /// Create a regular file descriptor.
    pub fn file(size: u64, modified: SystemTime) -> Self {
        Self::File { size, modified }
    }

    /// Create a symlink descriptor.
    pub fn symlink(target: impl Into<CompactString>) -> Self {
        Self::Symlink {
            target: target.into(),
        }
    }

    /// Create an unreadable descriptor.
    pub fn unreadable(message: impl Into<CompactString>) -> Self {
        Self::Unreadable {
            message: message.into(),
        }
    }

    /// Type tag of this entry.
    pub fn entry_type(&self) -> EntryType {
        match self {
            Self::File { .. } => EntryType::File,
            Self::Directory => EntryType::Directory,
            Self::Symlink { .. } => EntryType::Symlink,
            Self::Other => EntryType::Other,
            Self::Unreadable { .. } => EntryType::Unreadable,
        }
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Check if this is a symlink.
    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink { .. })
    }

    /// Check if this entry could not be read.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::Unreadable { .. })
    }

    /// File size, for regular files.
    pub fn size(&self) -> Option<u64> {
        match self {
            Self::File { size, .. } => Some(*size),
            _ => None,
        }
    }

    /// Modification time, for regular files.
    pub fn modified(&self) -> Option<SystemTime> {
        match self {
            Self::File { modified, .. } => Some(*modified),
            _ => None,
        }
    }
}
