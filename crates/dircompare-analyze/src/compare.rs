//! Directory comparison.
//!
//! Both roots are scanned independently, then joined on relative path.
//! Every path lands in exactly one of only-left, only-right, identical or
//! differing. For paths on both sides the first matching reason wins, in
//! this order: unreadable, type, link target, size, timestamp, content.

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local};
use compact_str::CompactString;
use itertools::{EitherOrBoth, Itertools};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tracing::{debug, info};

use dircompare_core::{
    CompareConfig, CompareError, EntryDescriptor, ExitStatus, ScanWarning, TreeSnapshot,
};
use dircompare_scan::TreeScanner;

use crate::content::compare_files;
use crate::relocate::{Relocation, find_relocations};

/// Why a path present on both sides is reported as differing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MismatchReason {
    /// Entries have different types (e.g. file vs directory).
    Type,
    /// Regular files have different sizes.
    Size,
    /// Regular files have different modification times.
    Timestamp,
    /// Regular files have different content (deep mode only).
    Content,
    /// Symlinks point to different targets.
    LinkTarget,
    /// At least one side could not be read.
    Unreadable,
}

/// A path reported as differing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    /// Relative path.
    pub path: CompactString,
    /// Most specific reason found.
    pub reason: MismatchReason,
    /// Human-readable explanation, e.g. both sizes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Difference {
    pub(crate) fn new(path: CompactString, reason: MismatchReason, detail: impl Into<String>) -> Self {
        Self {
            path,
            reason,
            detail: Some(detail.into()),
        }
    }
}

/// Summary counters for a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonStats {
    /// Entries recorded under the left root.
    pub left_entries: u64,
    /// Entries recorded under the right root.
    pub right_entries: u64,
    /// Paths identical on both sides.
    pub identical: u64,
    /// Paths only in the left tree.
    pub only_left: u64,
    /// Paths only in the right tree.
    pub only_right: u64,
    /// Paths present on both sides but differing.
    pub differing: u64,
    /// Differing paths whose reason is unreadable.
    pub unreadable: u64,
    /// Regular file pairs whose content was inspected.
    pub content_checked: u64,
    /// Bytes read during content inspection and relocation hashing.
    pub bytes_compared: u64,
    /// Relocation groups found.
    pub relocated: u64,
    /// Wall-clock duration of the whole comparison.
    pub duration: Duration,
}

/// Outcome of comparing two trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Canonical left root.
    pub left_root: PathBuf,
    /// Canonical right root.
    pub right_root: PathBuf,
    /// Paths only in the left tree, sorted.
    pub only_left: Vec<CompactString>,
    /// Paths only in the right tree, sorted.
    pub only_right: Vec<CompactString>,
    /// Paths on both sides that differ, sorted by path.
    pub differing: Vec<Difference>,
    /// Paths on both sides that match, sorted.
    pub identical: Vec<CompactString>,
    /// Orphaned files matched by content across sides.
    pub relocated: Vec<Relocation>,
    /// Per-entry problems from both scans.
    pub warnings: Vec<ScanWarning>,
    /// False if the deadline interrupted scanning or content checks.
    pub complete: bool,
    /// Summary counters.
    pub stats: ComparisonStats,
}

impl ComparisonResult {
    pub(crate) fn empty(left_root: PathBuf, right_root: PathBuf) -> Self {
        Self {
            left_root,
            right_root,
            only_left: Vec::new(),
            only_right: Vec::new(),
            differing: Vec::new(),
            identical: Vec::new(),
            relocated: Vec::new(),
            warnings: Vec::new(),
            complete: true,
            stats: ComparisonStats::default(),
        }
    }

    /// Check if any difference was found.
    pub fn has_differences(&self) -> bool {
        !self.only_left.is_empty() || !self.only_right.is_empty() || !self.differing.is_empty()
    }

    /// Check if the trees were fully compared and found identical.
    pub fn is_identical(&self) -> bool {
        self.complete && !self.has_differences()
    }

    /// Exit status for this result.
    ///
    /// Differences win over incompleteness: an interrupted comparison that
    /// already found a difference still reports differences.
    pub fn exit_status(&self) -> ExitStatus {
        if self.has_differences() {
            ExitStatus::Differences
        } else if self.complete {
            ExitStatus::Identical
        } else {
            ExitStatus::Fatal
        }
    }

    /// Look up the difference recorded for a path.
    pub fn difference(&self, path: &str) -> Option<&Difference> {
        self.differing.iter().find(|d| d.path == path)
    }

    /// Total number of classified paths.
    pub fn total_paths(&self) -> usize {
        self.only_left.len() + self.only_right.len() + self.differing.len() + self.identical.len()
    }
}

/// Classification of a path present on both sides, before content checks.
enum Verdict {
    Identical,
    Differs(MismatchReason, String),
    NeedsContent,
}

/// Compares two directory trees.
pub struct DirectoryComparator {
    config: CompareConfig,
}

impl DirectoryComparator {
    /// Create a comparator for the given configuration.
    pub fn new(config: CompareConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Scan both roots and compare them.
    ///
    /// Fails without a partial result if either root is missing, not a
    /// directory, or cannot be listed.
    pub fn compare(&self) -> Result<ComparisonResult, CompareError> {
        let start = Instant::now();
        let deadline = self.config.deadline_from(start);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| CompareError::InvalidConfig {
                message: e.to_string(),
            })?;

        let left_config = self.config.scan_config(&self.config.left, deadline);
        let right_config = self.config.scan_config(&self.config.right, deadline);
        let scanner = TreeScanner::new();

        info!(
            left = %self.config.left.display(),
            right = %self.config.right.display(),
            deep = self.config.deep,
            "comparing directories"
        );

        let (left, right) = pool.install(|| {
            rayon::join(|| scanner.scan(&left_config), || scanner.scan(&right_config))
        });
        let (left, right) = (left?, right?);

        let mut result = pool.install(|| self.classify(&left, &right, deadline));
        result.stats.duration = start.elapsed();

        info!(
            identical = result.stats.identical,
            only_left = result.stats.only_left,
            only_right = result.stats.only_right,
            differing = result.stats.differing,
            complete = result.complete,
            "comparison finished"
        );

        Ok(result)
    }

    /// Compare two snapshots that were already scanned.
    pub fn compare_snapshots(&self, left: &TreeSnapshot, right: &TreeSnapshot) -> ComparisonResult {
        let start = Instant::now();
        let mut result = self.classify(left, right, self.config.deadline_from(start));
        result.stats.duration = start.elapsed();
        result
    }

    fn classify(
        &self,
        left: &TreeSnapshot,
        right: &TreeSnapshot,
        deadline: Option<Instant>,
    ) -> ComparisonResult {
        let mut result = ComparisonResult::empty(left.root_path.clone(), right.root_path.clone());
        result.complete = left.complete && right.complete;
        result.warnings.extend(left.warnings.iter().cloned());
        result.warnings.extend(right.warnings.iter().cloned());

        let mut pending = Vec::new();
        let mut skipped = 0usize;

        for pair in left.iter().merge_join_by(right.iter(), |(a, _), (b, _)| a.cmp(b)) {
            match pair {
                // Absent on a side whose scan was cut short before reaching
                // the path: nothing is known, so the path is not reported.
                EitherOrBoth::Left((path, _)) if !right.covers(path) => skipped += 1,
                EitherOrBoth::Right((path, _)) if !left.covers(path) => skipped += 1,
                EitherOrBoth::Left((path, _)) => {
                    if right.under_unreadable(path) {
                        result.differing.push(Difference::new(
                            path.clone(),
                            MismatchReason::Unreadable,
                            "right side unknown: ancestor unreadable",
                        ));
                    } else {
                        result.only_left.push(path.clone());
                    }
                }
                EitherOrBoth::Right((path, _)) => {
                    if left.under_unreadable(path) {
                        result.differing.push(Difference::new(
                            path.clone(),
                            MismatchReason::Unreadable,
                            "left side unknown: ancestor unreadable",
                        ));
                    } else {
                        result.only_right.push(path.clone());
                    }
                }
                EitherOrBoth::Both((path, l), (_, r)) => match self.compare_entries(l, r) {
                    Verdict::Identical => result.identical.push(path.clone()),
                    Verdict::Differs(reason, detail) => {
                        result.differing.push(Difference::new(path.clone(), reason, detail));
                    }
                    Verdict::NeedsContent => pending.push(path.clone()),
                },
            }
        }

        if skipped > 0 {
            debug!(skipped, "paths beyond an incomplete scan left unclassified");
        }

        if !pending.is_empty() {
            self.check_content(left, right, pending, deadline, &mut result);
        }

        if self.config.match_content && !result.only_left.is_empty() && !result.only_right.is_empty()
        {
            let scan = find_relocations(
                left,
                right,
                &result.only_left,
                &result.only_right,
                deadline,
            );
            result.complete &= scan.complete;
            result.stats.bytes_compared += scan.bytes_hashed;
            result.relocated = scan.relocations;
        }

        result.differing.sort_by(|a, b| a.path.cmp(&b.path));
        result.identical.sort();

        result.stats.left_entries = left.len() as u64;
        result.stats.right_entries = right.len() as u64;
        result.stats.identical = result.identical.len() as u64;
        result.stats.only_left = result.only_left.len() as u64;
        result.stats.only_right = result.only_right.len() as u64;
        result.stats.differing = result.differing.len() as u64;
        result.stats.unreadable = result
            .differing
            .iter()
            .filter(|d| d.reason == MismatchReason::Unreadable)
            .count() as u64;
        result.stats.relocated = result.relocated.len() as u64;

        result
    }

    fn compare_entries(&self, left: &EntryDescriptor, right: &EntryDescriptor) -> Verdict {
        use EntryDescriptor::*;

        match (left, right) {
            (Unreadable { message }, _) => {
                Verdict::Differs(MismatchReason::Unreadable, format!("left: {message}"))
            }
            (_, Unreadable { message }) => {
                Verdict::Differs(MismatchReason::Unreadable, format!("right: {message}"))
            }
            _ if left.entry_type() != right.entry_type() => Verdict::Differs(
                MismatchReason::Type,
                format!("{} vs {}", left.entry_type(), right.entry_type()),
            ),
            (Symlink { target: a }, Symlink { target: b }) if a != b => {
                Verdict::Differs(MismatchReason::LinkTarget, format!("-> {a} vs -> {b}"))
            }
            (
                File {
                    size: left_size,
                    modified: left_time,
                },
                File {
                    size: right_size,
                    modified: right_time,
                },
            ) => {
                if left_size != right_size {
                    return Verdict::Differs(
                        MismatchReason::Size,
                        format!("{} vs {}", format_size(*left_size), format_size(*right_size)),
                    );
                }
                if !self.config.ignore_times
                    && time_distance(*left_time, *right_time) > self.config.mtime_tolerance
                {
                    return Verdict::Differs(
                        MismatchReason::Timestamp,
                        format!("{} vs {}", format_time(*left_time), format_time(*right_time)),
                    );
                }
                if self.config.deep {
                    Verdict::NeedsContent
                } else {
                    Verdict::Identical
                }
            }
            _ => Verdict::Identical,
        }
    }

    /// Inspect content of file pairs whose metadata matched.
    fn check_content(
        &self,
        left: &TreeSnapshot,
        right: &TreeSnapshot,
        pending: Vec<CompactString>,
        deadline: Option<Instant>,
        result: &mut ComparisonResult,
    ) {
        let method = self.config.deep_method;
        debug!(files = pending.len(), %method, "deep comparing");

        let outcomes: Vec<_> = pending
            .into_par_iter()
            .map(|path| {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return (path, None);
                }
                let outcome = compare_files(
                    &left.absolute_path(&path),
                    &right.absolute_path(&path),
                    method,
                );
                (path, Some(outcome))
            })
            .collect();

        for (path, outcome) in outcomes {
            match outcome {
                None => {
                    result.complete = false;
                    result.identical.push(path);
                }
                Some(Ok(outcome)) => {
                    result.stats.content_checked += 1;
                    result.stats.bytes_compared += outcome.bytes_read;
                    if outcome.equal {
                        result.identical.push(path);
                    } else {
                        result.differing.push(Difference::new(
                            path,
                            MismatchReason::Content,
                            format!("content differs ({method})"),
                        ));
                    }
                }
                Some(Err(err)) => {
                    result.differing.push(Difference::new(
                        path,
                        MismatchReason::Unreadable,
                        err.to_string(),
                    ));
                }
            }
        }
    }
}

fn time_distance(a: SystemTime, b: SystemTime) -> Duration {
    match a.duration_since(b) {
        Ok(d) => d,
        Err(e) => e.duration(),
    }
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(size: u64, secs: u64) -> EntryDescriptor {
        EntryDescriptor::file(size, SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn comparator() -> DirectoryComparator {
        DirectoryComparator::new(CompareConfig::new("/left", "/right"))
    }

    fn reason(verdict: Verdict) -> Option<MismatchReason> {
        match verdict {
            Verdict::Differs(reason, _) => Some(reason),
            _ => None,
        }
    }

    #[test]
    fn test_type_mismatch_takes_precedence() {
        let verdict = comparator().compare_entries(&file(1, 1), &EntryDescriptor::Directory);
        assert_eq!(reason(verdict), Some(MismatchReason::Type));
    }

    #[test]
    fn test_unreadable_takes_precedence_over_type() {
        let verdict = comparator()
            .compare_entries(&EntryDescriptor::unreadable("denied"), &EntryDescriptor::Directory);
        assert_eq!(reason(verdict), Some(MismatchReason::Unreadable));
    }

    #[test]
    fn test_size_checked_before_timestamp() {
        let verdict = comparator().compare_entries(&file(1, 1), &file(2, 2));
        assert_eq!(reason(verdict), Some(MismatchReason::Size));

        let verdict = comparator().compare_entries(&file(1, 1), &file(1, 2));
        assert_eq!(reason(verdict), Some(MismatchReason::Timestamp));
    }

    #[test]
    fn test_mtime_tolerance_and_ignore_times() {
        let mut config = CompareConfig::new("/l", "/r");
        config.mtime_tolerance = Duration::from_secs(2);
        let verdict = DirectoryComparator::new(config.clone()).compare_entries(&file(1, 10), &file(1, 12));
        assert!(matches!(verdict, Verdict::Identical));

        config.mtime_tolerance = Duration::ZERO;
        config.ignore_times = true;
        let verdict = DirectoryComparator::new(config).compare_entries(&file(1, 10), &file(1, 99));
        assert!(matches!(verdict, Verdict::Identical));
    }

    #[test]
    fn test_deep_mode_requests_content() {
        let mut config = CompareConfig::new("/l", "/r");
        config.deep = true;
        let verdict = DirectoryComparator::new(config).compare_entries(&file(1, 1), &file(1, 1));
        assert!(matches!(verdict, Verdict::NeedsContent));
    }

    #[test]
    fn test_symlink_targets() {
        let c = comparator();
        let same = c.compare_entries(&EntryDescriptor::symlink("a"), &EntryDescriptor::symlink("a"));
        assert!(matches!(same, Verdict::Identical));

        let differ = c.compare_entries(&EntryDescriptor::symlink("a"), &EntryDescriptor::symlink("b"));
        assert_eq!(reason(differ), Some(MismatchReason::LinkTarget));
    }

    #[test]
    fn test_time_distance_is_symmetric() {
        let a = SystemTime::UNIX_EPOCH + Duration::from_secs(5);
        let b = SystemTime::UNIX_EPOCH + Duration::from_secs(8);
        assert_eq!(time_distance(a, b), Duration::from_secs(3));
        assert_eq!(time_distance(b, a), Duration::from_secs(3));
    }

    #[test]
    fn test_exit_status() {
        let mut result = ComparisonResult::empty("/l".into(), "/r".into());
        assert_eq!(result.exit_status(), ExitStatus::Identical);

        result.complete = false;
        assert_eq!(result.exit_status(), ExitStatus::Fatal);

        result.only_left.push("x".into());
        assert_eq!(result.exit_status(), ExitStatus::Differences);
    }
}
