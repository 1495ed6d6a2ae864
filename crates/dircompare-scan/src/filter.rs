//! Glob-based exclusion of entries.

use globset::{Glob, GlobSet, GlobSetBuilder};

use dircompare_core::CompareError;

/// Compiled exclusion patterns.
#[derive(Debug, Clone)]
pub struct ExcludeFilter {
    set: GlobSet,
    patterns: usize,
}

impl ExcludeFilter {
    /// Compile a list of glob patterns.
    pub fn new(patterns: &[String]) -> Result<Self, CompareError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| CompareError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.kind().to_string(),
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| CompareError::InvalidPattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })?;
        Ok(Self {
            set,
            patterns: patterns.len(),
        })
    }

    /// Check whether an entry is excluded, by relative path or by name.
    pub fn is_excluded(&self, relative_path: &str, name: &str) -> bool {
        self.patterns > 0 && (self.set.is_match(relative_path) || self.set.is_match(name))
    }

    /// Check if no patterns were given.
    pub fn is_empty(&self) -> bool {
        self.patterns == 0
    }
}
