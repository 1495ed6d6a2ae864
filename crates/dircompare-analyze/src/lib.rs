//! Directory comparison for dircompare.
//!
//! This crate joins two [`TreeSnapshot`]s on relative path and classifies
//! every path as only-left, only-right, identical or differing:
//!
//! - **Metadata compare** - type, symlink target, size, modification time
//! - **Deep compare** - byte-for-byte (default) or BLAKE3 digest, run in
//!   parallel for file pairs whose metadata matched
//! - **Relocation matching** - orphaned files paired across sides by content
//! - **Reports** - plain text and JSON
//!
//! ```rust,no_run
//! use dircompare_analyze::{CompareConfig, DirectoryComparator, RenderOptions, render_text};
//!
//! let mut config = CompareConfig::new("/path/left", "/path/right");
//! config.deep = true;
//!
//! let result = DirectoryComparator::new(config).compare().unwrap();
//! print!("{}", render_text(&result, &RenderOptions::default()));
//! std::process::exit(result.exit_status().code() as i32);
//! ```

mod compare;
mod content;
mod relocate;
mod report;

pub use compare::{
    ComparisonResult, ComparisonStats, Difference, DirectoryComparator, MismatchReason,
};
pub use content::{ContentOutcome, compare_bytes, compare_files, hash_file};
pub use relocate::{Relocation, RelocationScan, find_relocations};
pub use report::{RenderOptions, render_json, render_text};

// Re-export core types
pub use dircompare_core::{
    CompareConfig, CompareError, ContentHash, DeepMethod, ExitStatus, TreeSnapshot,
};
