//! Directory snapshot scanner for dircompare.
//!
//! This crate walks one root directory with `jwalk` and records every entry
//! beneath it in a [`TreeSnapshot`], keyed by `/`-separated relative path.
//!
//! - **Symlinks** are recorded as links unless `follow_symlinks` is set, in
//!   which case links to directories are descended with cycle detection
//! - **Per-entry failures** become unreadable entries plus warnings; only
//!   problems with the root abort the scan
//! - **Exclusion** by glob pattern, matched on relative path or file name
//! - **Deadline** support: the scan stops early, is marked incomplete and
//!   remembers the first path it did not reach
//!
//! # Example
//!
//! ```rust,no_run
//! use dircompare_scan::{ScanConfig, TreeScanner};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let snapshot = TreeScanner::new().scan(&config).unwrap();
//!
//! println!("Files: {}", snapshot.stats.files);
//! for (path, entry) in snapshot.iter() {
//!     println!("{path}: {}", entry.entry_type());
//! }
//! ```

mod filter;
mod scanner;

pub use filter::ExcludeFilter;
pub use scanner::TreeScanner;

// Re-export core types for convenience
pub use dircompare_core::{
    CompareError, EntryDescriptor, EntryType, ScanConfig, ScanWarning, SnapshotStats,
    TreeSnapshot, WarningKind,
};
