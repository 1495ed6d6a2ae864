//! Tree snapshots keyed by relative path.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::entry::EntryDescriptor;
use crate::error::ScanWarning;

/// Join a relative parent path and a child name with `/`.
pub fn join_relative(parent: &str, name: &str) -> CompactString {
    if parent.is_empty() {
        CompactString::new(name)
    } else {
        let mut path = CompactString::with_capacity(parent.len() + name.len() + 1);
        path.push_str(parent);
        path.push('/');
        path.push_str(name);
        path
    }
}

/// Parent of a relative path, or `None` for top-level entries.
pub fn parent_relative(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

/// Order relative paths the way a sorted depth-first walk visits them:
/// component by component, parents before their children.
pub fn walk_order(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}

/// Counters for the entries of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    /// Regular files.
    pub files: u64,
    /// Directories (the root excluded).
    pub dirs: u64,
    /// Symbolic links recorded as links.
    pub symlinks: u64,
    /// Special files.
    pub other: u64,
    /// Entries that could not be read.
    pub unreadable: u64,
    /// Sum of regular file sizes.
    pub total_bytes: u64,
}

impl SnapshotStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one entry.
    pub fn record(&mut self, entry: &EntryDescriptor) {
        match entry {
            EntryDescriptor::File { size, .. } => {
                self.files += 1;
                self.total_bytes += size;
            }
            EntryDescriptor::Directory => self.dirs += 1,
            EntryDescriptor::Symlink { .. } => self.symlinks += 1,
            EntryDescriptor::Other => self.other += 1,
            EntryDescriptor::Unreadable { .. } => self.unreadable += 1,
        }
    }

    /// Undo the count of one entry.
    fn forget(&mut self, entry: &EntryDescriptor) {
        match entry {
            EntryDescriptor::File { size, .. } => {
                self.files -= 1;
                self.total_bytes -= size;
            }
            EntryDescriptor::Directory => self.dirs -= 1,
            EntryDescriptor::Symlink { .. } => self.symlinks -= 1,
            EntryDescriptor::Other => self.other -= 1,
            EntryDescriptor::Unreadable { .. } => self.unreadable -= 1,
        }
    }

    /// Total number of entries.
    pub fn total_entries(&self) -> u64 {
        self.files + self.dirs + self.symlinks + self.other + self.unreadable
    }
}

/// Everything known about one root after a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Canonical root path that was scanned.
    pub root_path: PathBuf,

    /// Entries keyed by `/`-separated path relative to the root.
    pub entries: BTreeMap<CompactString, EntryDescriptor>,

    /// Entry counters.
    pub stats: SnapshotStats,

    /// Per-entry problems encountered during the scan.
    pub warnings: Vec<ScanWarning>,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// False if the scan stopped early because its deadline passed.
    pub complete: bool,

    /// First path the scan did not get to, in walk order. Only paths that
    /// sort before it were covered by an incomplete scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontier: Option<CompactString>,
}

impl TreeSnapshot {
    /// Create an empty, complete snapshot for a root.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            entries: BTreeMap::new(),
            stats: SnapshotStats::new(),
            warnings: Vec::new(),
            scan_duration: Duration::ZERO,
            complete: true,
            frontier: None,
        }
    }

    /// Mark the scan as cut short before reaching `frontier`.
    pub fn mark_incomplete(&mut self, frontier: impl Into<CompactString>) {
        self.complete = false;
        self.frontier = Some(frontier.into());
    }

    /// Check whether the scan got far enough to know if `path` exists.
    ///
    /// An incomplete snapshot without a frontier covers nothing.
    pub fn covers(&self, path: &str) -> bool {
        self.complete
            || self
                .frontier
                .as_deref()
                .is_some_and(|frontier| walk_order(path, frontier).is_lt())
    }

    /// Absolute path of a relative path under this snapshot's root.
    pub fn absolute_path(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root_path.clone(), |path, part| path.join(part))
    }

    /// Record an entry, replacing any previous descriptor for the path.
    pub fn insert(
        &mut self,
        path: impl Into<CompactString>,
        entry: EntryDescriptor,
    ) -> Option<EntryDescriptor> {
        self.stats.record(&entry);
        let previous = self.entries.insert(path.into(), entry);
        if let Some(ref old) = previous {
            self.stats.forget(old);
        }
        previous
    }

    /// Look up an entry by relative path.
    pub fn get(&self, path: &str) -> Option<&EntryDescriptor> {
        self.entries.get(path)
    }

    /// Check if a relative path is present.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&CompactString, &EntryDescriptor)> {
        self.entries.iter()
    }

    /// Nearest ancestor of `path` that is recorded in this snapshot.
    pub fn nearest_ancestor<'a>(&self, path: &'a str) -> Option<(&'a str, &EntryDescriptor)> {
        let mut current = parent_relative(path);
        while let Some(parent) = current {
            if let Some(entry) = self.entries.get(parent) {
                return Some((parent, entry));
            }
            current = parent_relative(parent);
        }
        None
    }

    /// Check whether the nearest recorded ancestor of `path` is unreadable,
    /// meaning the path's presence on this side is unknown.
    pub fn under_unreadable(&self, path: &str) -> bool {
        self.nearest_ancestor(path)
            .is_some_and(|(_, entry)| entry.is_unreadable())
    }

    /// Record a non-fatal warning.
    pub fn add_warning(&mut self, warning: ScanWarning) {
        self.warnings.push(warning);
    }
}
