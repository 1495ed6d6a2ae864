use dircompare_core::{
    CompareConfig, CompareError, ContentHash, DeepMethod, EntryDescriptor, EntryType,
    ExitStatus, ScanConfig, ScanWarning, TreeSnapshot, WarningKind,
};
use std::time::{Duration, Instant, SystemTime};

#[test]
fn test_content_hash_creation_and_hex() {
    let bytes = [0xab; 32];
    let hash = ContentHash::new(bytes);

    let hex = hash.to_hex();
    assert_eq!(hex.len(), 64);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));

    assert_eq!(hash, ContentHash::new(bytes));
    assert_ne!(hash, ContentHash::new([0xcd; 32]));
}

#[test]
fn test_entry_descriptor_discrimination() {
    let now = SystemTime::now();

    let file = EntryDescriptor::file(10, now);
    assert!(file.is_file());
    assert!(!file.is_dir());
    assert!(!file.is_symlink());

    let dir = EntryDescriptor::Directory;
    assert!(dir.is_dir());
    assert!(!dir.is_file());

    let link = EntryDescriptor::symlink("../target");
    assert!(link.is_symlink());
    match &link {
        EntryDescriptor::Symlink { target } => assert_eq!(target.as_str(), "../target"),
        _ => panic!("Expected Symlink descriptor"),
    }

    let unreadable = EntryDescriptor::unreadable("Permission denied");
    assert!(unreadable.is_unreadable());
    assert_eq!(unreadable.entry_type(), EntryType::Unreadable);
}

#[test]
fn test_entry_descriptor_serializes_with_type_tag() {
    let json = serde_json::to_value(EntryDescriptor::symlink("dest")).unwrap();
    assert_eq!(json["type"], "symlink");
    assert_eq!(json["target"], "dest");

    let json = serde_json::to_value(EntryDescriptor::Directory).unwrap();
    assert_eq!(json["type"], "directory");
}

#[test]
fn test_snapshot_ordering_and_lookup() {
    let now = SystemTime::now();
    let mut snapshot = TreeSnapshot::new("/root");
    snapshot.insert("b.txt", EntryDescriptor::file(1, now));
    snapshot.insert("a", EntryDescriptor::Directory);
    snapshot.insert("a/z.txt", EntryDescriptor::file(2, now));

    let paths: Vec<&str> = snapshot.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec!["a", "a/z.txt", "b.txt"]);

    assert!(snapshot.contains("a/z.txt"));
    assert_eq!(snapshot.get("b.txt").and_then(|e| e.size()), Some(1));
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.complete);
    assert!(snapshot.warnings.is_empty());
}

#[test]
fn test_snapshot_nearest_ancestor() {
    let mut snapshot = TreeSnapshot::new("/root");
    snapshot.insert("a", EntryDescriptor::Directory);
    snapshot.insert("a/b", EntryDescriptor::unreadable("denied"));

    let (path, entry) = snapshot.nearest_ancestor("a/b/c/d.txt").unwrap();
    assert_eq!(path, "a/b");
    assert!(entry.is_unreadable());

    let (path, _) = snapshot.nearest_ancestor("a/x.txt").unwrap();
    assert_eq!(path, "a");

    assert!(snapshot.nearest_ancestor("top.txt").is_none());
}

#[test]
fn test_snapshot_warnings() {
    let mut snapshot = TreeSnapshot::new("/root");
    snapshot.add_warning(ScanWarning::broken_symlink("/root/link", "missing"));
    assert_eq!(snapshot.warnings.len(), 1);
    assert_eq!(snapshot.warnings[0].kind, WarningKind::BrokenSymlink);
    assert!(snapshot.warnings[0].message.contains("missing"));
}

#[test]
fn test_compare_config_deadline() {
    let start = Instant::now();
    let mut config = CompareConfig::new("/a", "/b");
    assert!(config.deadline_from(start).is_none());

    config.timeout = Some(Duration::from_secs(5));
    assert_eq!(config.deadline_from(start), Some(start + Duration::from_secs(5)));

    let scan = config.scan_config(&config.left, config.deadline_from(start));
    assert!(scan.deadline.is_some());
    assert!(!scan.deadline_passed());
}

#[test]
fn test_scan_config_serde_skips_deadline() {
    let mut config = ScanConfig::new("/root");
    config.deadline = Some(Instant::now());

    let json = serde_json::to_string(&config).unwrap();
    let parsed: ScanConfig = serde_json::from_str(&json).unwrap();
    assert!(parsed.deadline.is_none());
    assert_eq!(parsed.root, config.root);
}

#[test]
fn test_compare_config_deep_method_serde() {
    let config = CompareConfig::builder()
        .left("/a")
        .right("/b")
        .deep(true)
        .deep_method(DeepMethod::Hash)
        .build()
        .unwrap();

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["deep_method"], "hash");
}

#[test]
fn test_error_exit_statuses() {
    let missing = CompareError::NotFound { path: "/nope".into() };
    assert_eq!(missing.exit_status(), ExitStatus::InvalidInput);
    assert!(missing.to_string().contains("/nope"));

    let not_dir = CompareError::NotADirectory { path: "/file".into() };
    assert_eq!(not_dir.exit_status().code(), 2);

    let io = CompareError::io("/root", std::io::Error::other("disk on fire"));
    assert_eq!(io.exit_status(), ExitStatus::Fatal);
    assert_eq!(io.exit_status().code(), 3);
}
