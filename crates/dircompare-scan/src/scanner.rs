//! jwalk-based directory scanner producing tree snapshots.

use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::time::{Instant, SystemTime};

use compact_str::CompactString;
use jwalk::{Parallelism, WalkDirGeneric};
use tracing::{debug, warn};

use dircompare_core::{
    CompareError, EntryDescriptor, ScanConfig, ScanWarning, TreeSnapshot, WarningKind,
    join_relative,
};

use crate::filter::ExcludeFilter;

/// Per-entry client state is set on followed links that lead back to the
/// directory being read or one of its ancestors.
type Walker = WalkDirGeneric<((), bool)>;
type WalkEntry = jwalk::DirEntry<((), bool)>;

/// Scanner that records every entry under a root.
///
/// The walk is serial with children sorted by name, so entries arrive in
/// walk order and a deadline cut leaves a well-defined frontier. Only
/// problems with the root itself are returned as errors. Anything that goes
/// wrong below the root is recorded as an unreadable entry plus a warning.
#[derive(Debug, Default)]
pub struct TreeScanner;

impl TreeScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Perform a scan of the configured root.
    pub fn scan(&self, config: &ScanConfig) -> Result<TreeSnapshot, CompareError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| CompareError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(CompareError::NotADirectory { path: root_path });
        }

        // Listing the root must work; failures below it are per-entry.
        fs::read_dir(&root_path).map_err(|e| CompareError::io(&root_path, e))?;

        let filter = ExcludeFilter::new(&config.exclude_patterns)?;

        debug!(root = %root_path.display(), follow_symlinks = config.follow_symlinks, "scanning");

        let mut snapshot = TreeSnapshot::new(&root_path);

        for entry_result in walker(config, &root_path, filter) {
            if config.deadline_passed() {
                let frontier = match &entry_result {
                    Ok(entry) => relative_path(&root_path, &entry.path()),
                    Err(err) => err.path().and_then(|p| relative_path(&root_path, p)),
                };
                warn!(root = %root_path.display(), "scan deadline reached");
                snapshot.mark_incomplete(frontier.unwrap_or_default());
                break;
            }

            match entry_result {
                Ok(entry) => record_entry(&mut snapshot, entry),
                Err(err) => record_error(&mut snapshot, &err)?,
            }
        }

        snapshot.scan_duration = start.elapsed();

        debug!(
            root = %snapshot.root_path.display(),
            entries = snapshot.len(),
            warnings = snapshot.warnings.len(),
            complete = snapshot.complete,
            elapsed_ms = snapshot.scan_duration.as_millis() as u64,
            "scan finished"
        );

        Ok(snapshot)
    }
}

fn walker(config: &ScanConfig, root_path: &Path, filter: ExcludeFilter) -> Walker {
    let root = root_path.to_path_buf();
    let follow_symlinks = config.follow_symlinks;

    Walker::new(root_path)
        .parallelism(Parallelism::Serial)
        .sort(true)
        .skip_hidden(false)
        .follow_links(follow_symlinks)
        .process_read_dir(move |_depth, dir, _state, children| {
            if !filter.is_empty() {
                let parent = relative_path(&root, dir).unwrap_or_default();
                children.retain(|child| match child {
                    Ok(entry) => {
                        let name = entry.file_name.to_string_lossy();
                        !filter.is_excluded(&join_relative(&parent, &name), &name)
                    }
                    Err(_) => true,
                });
            }
            if follow_symlinks {
                stop_cycles(dir, children);
            }
        })
}

/// Keep the walker out of followed links that resolve to `dir` or one of its
/// ancestors.
fn stop_cycles(dir: &Path, children: &mut [jwalk::Result<WalkEntry>]) {
    let Ok(dir) = dir.canonicalize() else {
        return;
    };

    for entry in children.iter_mut().flatten() {
        if entry.read_children_path.is_none() {
            continue;
        }
        let path = entry.path();
        if !is_symlink(&path) {
            continue;
        }
        if path.canonicalize().is_ok_and(|target| dir.starts_with(&target)) {
            entry.read_children_path = None;
            entry.client_state = true;
        }
    }
}

fn record_entry(snapshot: &mut TreeSnapshot, entry: WalkEntry) {
    let path = entry.path();
    let relative = match relative_path(&snapshot.root_path, &path) {
        Some(relative) if !relative.is_empty() => relative,
        _ => return,
    };

    if entry.client_state {
        let target = link_target(&path);
        debug!(path = %path.display(), "symlink cycle, not descending");
        snapshot.add_warning(ScanWarning::symlink_cycle(&path, &target));
        snapshot.insert(relative, EntryDescriptor::Symlink { target });
        return;
    }

    let file_type = entry.file_type();
    if file_type.is_symlink() {
        // Either links are not followed or the target could not be resolved.
        match fs::read_link(&path) {
            Ok(target) => {
                let target = CompactString::new(target.to_string_lossy());
                if fs::metadata(&path).is_err() {
                    snapshot.add_warning(ScanWarning::broken_symlink(&path, &target));
                }
                snapshot.insert(relative, EntryDescriptor::Symlink { target });
            }
            Err(err) => record_failure(snapshot, relative, &path, &err, WarningKind::MetadataError),
        }
    } else if file_type.is_dir() {
        snapshot.insert(relative, EntryDescriptor::Directory);
    } else if file_type.is_file() {
        match entry.metadata() {
            Ok(metadata) => {
                snapshot.insert(relative, file_descriptor(&metadata));
            }
            Err(err) => {
                let err = to_io_error(&err);
                record_failure(snapshot, relative, &path, &err, WarningKind::MetadataError);
            }
        }
    } else {
        snapshot.insert(relative, EntryDescriptor::Other);
    }
}

/// Record an error reported by the walker against the entry it concerns.
fn record_error(snapshot: &mut TreeSnapshot, err: &jwalk::Error) -> Result<(), CompareError> {
    let io_err = to_io_error(err);
    let Some(path) = err.path().map(Path::to_path_buf) else {
        warn!(error = %err, "walk error without a path");
        let warning = ScanWarning::from_io(&snapshot.root_path, &io_err, WarningKind::ReadError);
        snapshot.add_warning(warning);
        return Ok(());
    };
    let Some(relative) = relative_path(&snapshot.root_path, &path) else {
        warn!(path = %path.display(), error = %err, "walk error outside the root");
        return Ok(());
    };

    if relative.is_empty() {
        return Err(CompareError::io(path, io_err));
    }

    if snapshot.contains(&relative) {
        // Listed by its parent, then failed to list its own children.
        record_failure(snapshot, relative, &path, &io_err, WarningKind::ReadError);
    } else if is_symlink(&path) {
        // A followed link whose target cannot be resolved.
        let target = link_target(&path);
        snapshot.add_warning(ScanWarning::broken_symlink(&path, &target));
        snapshot.insert(relative, EntryDescriptor::Symlink { target });
    } else {
        record_failure(snapshot, relative, &path, &io_err, WarningKind::MetadataError);
    }
    Ok(())
}

fn record_failure(
    snapshot: &mut TreeSnapshot,
    relative: CompactString,
    path: &Path,
    err: &io::Error,
    kind: WarningKind,
) {
    warn!(path = %path.display(), error = %err, "unreadable entry");
    snapshot.add_warning(ScanWarning::from_io(path, err, kind));
    snapshot.insert(relative, EntryDescriptor::unreadable(err.to_string()));
}

/// `/`-separated path of `path` below `root`; empty for the root itself.
fn relative_path(root: &Path, path: &Path) -> Option<CompactString> {
    let stripped = path.strip_prefix(root).ok()?;
    Some(stripped.components().fold(CompactString::default(), |parent, part| {
        join_relative(&parent, &part.as_os_str().to_string_lossy())
    }))
}

/// The walker's error as an `io::Error`, keeping its kind and message.
fn to_io_error(err: &jwalk::Error) -> io::Error {
    let kind = err.io_error().map_or(io::ErrorKind::Other, io::Error::kind);
    io::Error::new(kind, err.to_string())
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

fn link_target(path: &Path) -> CompactString {
    fs::read_link(path)
        .map(|target| CompactString::new(target.to_string_lossy()))
        .unwrap_or_default()
}

fn file_descriptor(metadata: &Metadata) -> EntryDescriptor {
    EntryDescriptor::file(
        metadata.len(),
        metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    )
}
