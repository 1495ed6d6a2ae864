//! Core types for dircompare.
//!
//! This crate provides the data model shared by the scanner and the
//! comparator: entry descriptors, tree snapshots keyed by relative path,
//! configuration, and the error taxonomy.

mod config;
mod entry;
mod error;
mod snapshot;

pub use config::{CompareConfig, CompareConfigBuilder, DeepMethod, ScanConfig, ScanConfigBuilder};
pub use entry::{ContentHash, EntryDescriptor, EntryType};
pub use error::{CompareError, ExitStatus, ScanWarning, WarningKind};
pub use snapshot::{SnapshotStats, TreeSnapshot, join_relative, parent_relative, walk_order};
