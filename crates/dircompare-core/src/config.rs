//! Scan and comparison configuration types.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// How file content is inspected in deep compare mode.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeepMethod {
    /// Stream both files and compare byte for byte.
    #[default]
    Bytes,
    /// Compare BLAKE3 digests of both files.
    Hash,
}

/// Configuration for scanning a single root.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Glob patterns to exclude, matched against relative paths and names.
    #[builder(default)]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Stop scanning once this instant has passed.
    #[builder(default)]
    #[serde(skip)]
    pub deadline: Option<Instant>,
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
            exclude_patterns: Vec::new(),
            deadline: None,
        }
    }

    /// Check whether the deadline has passed.
    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Configuration for comparing two directory trees.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CompareConfig {
    /// Left root.
    pub left: PathBuf,

    /// Right root.
    pub right: PathBuf,

    /// Follow symbolic links while scanning.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Inspect file content when metadata matches.
    #[builder(default = "false")]
    #[serde(default)]
    pub deep: bool,

    /// Content inspection method used in deep mode.
    #[builder(default)]
    #[serde(default)]
    pub deep_method: DeepMethod,

    /// Skip the modification time check.
    #[builder(default = "false")]
    #[serde(default)]
    pub ignore_times: bool,

    /// Modification times closer than this are considered equal.
    #[builder(default = "Duration::ZERO")]
    #[serde(default)]
    pub mtime_tolerance: Duration,

    /// Glob patterns excluded from both trees.
    #[builder(default)]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Match orphaned files across sides by content.
    #[builder(default = "false")]
    #[serde(default)]
    pub match_content: bool,

    /// Number of worker threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Upper bound on the whole comparison.
    #[builder(default)]
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl CompareConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        for (side, root) in [("Left", &self.left), ("Right", &self.right)] {
            match root {
                Some(root) if root.as_os_str().is_empty() => {
                    return Err(format!("{side} root path cannot be empty"));
                }
                Some(_) => {}
                None => return Err(format!("{side} root path is required")),
            }
        }
        Ok(())
    }
}

impl CompareConfig {
    /// Create a new compare config builder.
    pub fn builder() -> CompareConfigBuilder {
        CompareConfigBuilder::default()
    }

    /// Create a metadata-only comparison of two roots.
    pub fn new(left: impl Into<PathBuf>, right: impl Into<PathBuf>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            follow_symlinks: false,
            deep: false,
            deep_method: DeepMethod::default(),
            ignore_times: false,
            mtime_tolerance: Duration::ZERO,
            exclude_patterns: Vec::new(),
            match_content: false,
            threads: 0,
            timeout: None,
        }
    }

    /// Deadline derived from the timeout, measured from `start`.
    pub fn deadline_from(&self, start: Instant) -> Option<Instant> {
        self.timeout.and_then(|t| start.checked_add(t))
    }

    /// Scan configuration for one of the two roots.
    pub fn scan_config(&self, root: &Path, deadline: Option<Instant>) -> ScanConfig {
        ScanConfig {
            root: root.to_path_buf(),
            follow_symlinks: self.follow_symlinks,
            exclude_patterns: self.exclude_patterns.clone(),
            deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .follow_symlinks(true)
            .exclude_patterns(vec!["*.log".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert!(config.follow_symlinks);
        assert_eq!(config.exclude_patterns.len(), 1);
        assert!(config.deadline.is_none());
    }

    #[test]
    fn test_scan_config_requires_root() {
        assert!(ScanConfig::builder().build().is_err());
        assert!(ScanConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_deadline_passed() {
        let mut config = ScanConfig::new("/test");
        assert!(!config.deadline_passed());

        config.deadline = Some(Instant::now());
        assert!(config.deadline_passed());
    }

    #[test]
    fn test_compare_config_defaults() {
        let config = CompareConfig::new("/a", "/b");
        assert!(!config.deep);
        assert_eq!(config.deep_method, DeepMethod::Bytes);
        assert!(!config.follow_symlinks);
        assert_eq!(config.mtime_tolerance, Duration::ZERO);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_compare_config_builder_validation() {
        let err = CompareConfig::builder().left("/a").build().unwrap_err();
        assert!(err.to_string().contains("Right root path is required"));

        let config = CompareConfig::builder()
            .left("/a")
            .right("/b")
            .deep(true)
            .deep_method(DeepMethod::Hash)
            .build()
            .unwrap();
        assert!(config.deep);
        assert_eq!(config.deep_method, DeepMethod::Hash);
    }

    #[test]
    fn test_scan_config_inherits_options() {
        let config = CompareConfig::builder()
            .left("/a")
            .right("/b")
            .follow_symlinks(true)
            .exclude_patterns(vec!["target".to_string()])
            .build()
            .unwrap();

        let scan = config.scan_config(&config.right, None);
        assert_eq!(scan.root, PathBuf::from("/b"));
        assert!(scan.follow_symlinks);
        assert_eq!(scan.exclude_patterns, vec!["target".to_string()]);
    }

    #[test]
    fn test_deep_method_parse() {
        assert_eq!("hash".parse::<DeepMethod>().unwrap(), DeepMethod::Hash);
        assert_eq!(DeepMethod::Bytes.to_string(), "bytes");
    }
}
