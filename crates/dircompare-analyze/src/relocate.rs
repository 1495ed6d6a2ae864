//! Content matching between files present on only one side.
//!
//! A file that was moved or renamed shows up once in only-left and once in
//! only-right. Matching those orphans by content finds the pairs:
//! 1. Group orphaned files by size (no I/O)
//! 2. Hash only sizes that occur on both sides, in parallel
//! 3. Pair up hashes present on both sides

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use compact_str::CompactString;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dircompare_core::{ContentHash, TreeSnapshot};

use crate::content::hash_file_counted;

/// Files with identical content found at different paths on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    /// Content hash shared by all paths.
    pub hash: ContentHash,
    /// File size in bytes.
    pub size: u64,
    /// Paths present only in the left tree.
    pub left_paths: Vec<CompactString>,
    /// Paths present only in the right tree.
    pub right_paths: Vec<CompactString>,
}

/// Result of relocation matching.
#[derive(Debug, Clone, Default)]
pub struct RelocationScan {
    /// Matches, sorted by first left path.
    pub relocations: Vec<Relocation>,
    /// Bytes read while hashing candidates on both sides.
    pub bytes_hashed: u64,
    /// False if the deadline cut hashing short.
    pub complete: bool,
}

/// Match orphaned regular files across the two snapshots by content.
pub fn find_relocations(
    left: &TreeSnapshot,
    right: &TreeSnapshot,
    only_left: &[CompactString],
    only_right: &[CompactString],
    deadline: Option<Instant>,
) -> RelocationScan {
    let left_files = sized_files(left, only_left);
    let right_files = sized_files(right, only_right);

    let left_sizes: HashSet<u64> = left_files.iter().map(|(_, size)| *size).collect();
    let right_sizes: HashSet<u64> = right_files.iter().map(|(_, size)| *size).collect();

    let left_candidates: Vec<_> = left_files
        .into_iter()
        .filter(|(_, size)| right_sizes.contains(size))
        .collect();
    let right_candidates: Vec<_> = right_files
        .into_iter()
        .filter(|(_, size)| left_sizes.contains(size))
        .collect();

    if left_candidates.is_empty() {
        return RelocationScan {
            complete: true,
            ..RelocationScan::default()
        };
    }

    debug!(
        left = left_candidates.len(),
        right = right_candidates.len(),
        "hashing relocation candidates"
    );

    let left_hashed = hash_candidates(left, left_candidates, deadline);
    let right_hashed = hash_candidates(right, right_candidates, deadline);
    let right_hashes = right_hashed.groups;

    let mut relocations: Vec<Relocation> = left_hashed
        .groups
        .into_iter()
        .filter_map(|(hash, (size, mut left_paths))| {
            let (_, right_paths) = right_hashes.get(&hash)?;
            let mut right_paths = right_paths.clone();
            left_paths.sort();
            right_paths.sort();
            Some(Relocation {
                hash,
                size,
                left_paths,
                right_paths,
            })
        })
        .collect();
    relocations.sort_by(|a, b| a.left_paths.cmp(&b.left_paths));

    RelocationScan {
        relocations,
        bytes_hashed: left_hashed.bytes_read + right_hashed.bytes_read,
        complete: left_hashed.complete && right_hashed.complete,
    }
}

/// Non-empty regular files among `paths`, with their sizes.
fn sized_files(snapshot: &TreeSnapshot, paths: &[CompactString]) -> Vec<(CompactString, u64)> {
    paths
        .iter()
        .filter_map(|path| {
            let size = snapshot.get(path)?.size()?;
            (size > 0).then(|| (path.clone(), size))
        })
        .collect()
}

/// Candidates of one side grouped by content hash.
struct HashedSide {
    groups: HashMap<ContentHash, (u64, Vec<CompactString>)>,
    bytes_read: u64,
    complete: bool,
}

fn hash_candidates(
    snapshot: &TreeSnapshot,
    candidates: Vec<(CompactString, u64)>,
    deadline: Option<Instant>,
) -> HashedSide {
    let hashed: Vec<Option<(CompactString, u64, Option<(ContentHash, u64)>)>> = candidates
        .into_par_iter()
        .map(|(path, size)| {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return None;
            }
            let hash = match hash_file_counted(&snapshot.absolute_path(&path)) {
                Ok(hashed) => Some(hashed),
                Err(err) => {
                    warn!(path = %path, error = %err, "failed to hash file");
                    None
                }
            };
            Some((path, size, hash))
        })
        .collect();

    let mut side = HashedSide {
        groups: HashMap::new(),
        bytes_read: 0,
        complete: hashed.iter().all(Option::is_some),
    };
    for (path, size, hash) in hashed.into_iter().flatten() {
        if let Some((hash, bytes_read)) = hash {
            side.bytes_read += bytes_read;
            side.groups.entry(hash).or_insert_with(|| (size, Vec::new())).1.push(path);
        }
    }
    side
}
