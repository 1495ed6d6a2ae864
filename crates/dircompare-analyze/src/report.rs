//! Text and JSON rendering of comparison results.

use std::path::Path;

use compact_str::CompactString;
use serde::Serialize;

use dircompare_core::ScanWarning;

use crate::compare::{ComparisonResult, ComparisonStats};

const RULE_WIDTH: usize = 70;

/// Options controlling what a report includes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// List identical paths as well.
    pub show_identical: bool,
}

/// Render a human-readable report.
pub fn render_text(result: &ComparisonResult, options: &RenderOptions) -> String {
    let rule = "─".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        " Directory Comparison".to_string(),
        rule,
        format!(" Left:  {}", result.left_root.display()),
        format!(" Right: {}", result.right_root.display()),
        String::new(),
    ];

    section(&mut lines, "Only in LEFT", result.only_left.iter().map(|p| p.to_string()));
    section(&mut lines, "Only in RIGHT", result.only_right.iter().map(|p| p.to_string()));
    section(
        &mut lines,
        "Differing",
        result.differing.iter().map(|d| match &d.detail {
            Some(detail) => format!("{}  [{}] {}", d.path, d.reason, detail),
            None => format!("{}  [{}]", d.path, d.reason),
        }),
    );

    if !result.relocated.is_empty() {
        section(
            &mut lines,
            "Relocated",
            result.relocated.iter().map(|r| {
                format!(
                    "{} -> {}  ({})",
                    r.left_paths.join(", "),
                    r.right_paths.join(", "),
                    format_size(r.size)
                )
            }),
        );
    }

    if options.show_identical {
        section(&mut lines, "Identical", result.identical.iter().map(|p| p.to_string()));
    }

    let stats = &result.stats;
    lines.push(String::new());
    lines.push(format!(
        " {} identical, {} only in left, {} only in right, {} differing",
        stats.identical, stats.only_left, stats.only_right, stats.differing
    ));
    if stats.content_checked > 0 || stats.relocated > 0 {
        lines.push(format!(
            " {} file(s) content-checked, {} read",
            stats.content_checked,
            format_size(stats.bytes_compared)
        ));
    }
    lines.push(format!(" Compared in {:.2}s", stats.duration.as_secs_f64()));

    if !result.warnings.is_empty() {
        lines.push(format!(" {} warning(s) during scan", result.warnings.len()));
    }
    if !result.complete {
        lines.push(" INCOMPLETE: time limit reached before the comparison finished".to_string());
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn section(lines: &mut Vec<String>, title: &str, items: impl ExactSizeIterator<Item = String>) {
    lines.push(format!(" {title} ({})", items.len()));
    lines.extend(items.map(|item| format!("   {item}")));
}

/// Machine-readable report.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    left: &'a Path,
    right: &'a Path,
    complete: bool,
    only_left: Vec<JsonEntry<'a>>,
    only_right: Vec<JsonEntry<'a>>,
    differing: Vec<JsonEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    identical: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    relocated: Vec<JsonRelocation<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<&'a ScanWarning>,
    stats: &'a ComparisonStats,
}

#[derive(Debug, Serialize)]
struct JsonEntry<'a> {
    path: &'a str,
    reason: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct JsonRelocation<'a> {
    hash: String,
    size: u64,
    left_paths: Vec<&'a str>,
    right_paths: Vec<&'a str>,
}

/// Render the report as pretty-printed JSON.
pub fn render_json(result: &ComparisonResult, options: &RenderOptions) -> serde_json::Result<String> {
    let report = JsonReport {
        left: &result.left_root,
        right: &result.right_root,
        complete: result.complete,
        only_left: orphans(&result.only_left, "only_in_left"),
        only_right: orphans(&result.only_right, "only_in_right"),
        differing: result
            .differing
            .iter()
            .map(|d| JsonEntry {
                path: d.path.as_str(),
                reason: d.reason.as_ref(),
                detail: d.detail.as_deref(),
            })
            .collect(),
        identical: options
            .show_identical
            .then(|| result.identical.iter().map(|p| p.as_str()).collect()),
        relocated: result
            .relocated
            .iter()
            .map(|r| JsonRelocation {
                hash: r.hash.to_hex(),
                size: r.size,
                left_paths: r.left_paths.iter().map(|p| p.as_str()).collect(),
                right_paths: r.right_paths.iter().map(|p| p.as_str()).collect(),
            })
            .collect(),
        warnings: result.warnings.iter().collect(),
        stats: &result.stats,
    };

    serde_json::to_string_pretty(&report)
}

fn orphans<'a>(paths: &'a [CompactString], reason: &'static str) -> Vec<JsonEntry<'a>> {
    paths
        .iter()
        .map(|path| JsonEntry {
            path: path.as_str(),
            reason,
            detail: None,
        })
        .collect()
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{Difference, MismatchReason};

    fn sample() -> ComparisonResult {
        let mut result = ComparisonResult::empty("/left".into(), "/right".into());
        result.only_left.push("b.txt".into());
        result.only_right.push("c.txt".into());
        result.identical.push("a.txt".into());
        result.differing.push(Difference::new(
            "d.txt".into(),
            MismatchReason::Size,
            "2 B vs 3 B",
        ));
        result.stats.identical = 1;
        result.stats.only_left = 1;
        result.stats.only_right = 1;
        result.stats.differing = 1;
        result
    }

    #[test]
    fn test_text_sections() {
        let text = render_text(&sample(), &RenderOptions::default());
        assert!(text.contains(" Only in LEFT (1)\n   b.txt"));
        assert!(text.contains(" Only in RIGHT (1)\n   c.txt"));
        assert!(text.contains(" Differing (1)\n   d.txt  [size] 2 B vs 3 B"));
        assert!(!text.contains("Identical ("));
        assert!(!text.contains("INCOMPLETE"));
    }

    #[test]
    fn test_text_identical_and_incomplete() {
        let mut result = sample();
        result.complete = false;
        let text = render_text(&result, &RenderOptions { show_identical: true });
        assert!(text.contains(" Identical (1)\n   a.txt"));
        assert!(text.contains("INCOMPLETE"));
    }

    #[test]
    fn test_json_categories() {
        let json = render_json(&sample(), &RenderOptions::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["complete"], true);
        assert_eq!(value["only_left"][0]["path"], "b.txt");
        assert_eq!(value["only_left"][0]["reason"], "only_in_left");
        assert_eq!(value["only_right"][0]["reason"], "only_in_right");
        assert_eq!(value["differing"][0]["reason"], "size");
        assert_eq!(value["differing"][0]["detail"], "2 B vs 3 B");
        assert!(value.get("identical").is_none());
        assert!(value.get("relocated").is_none());
        assert_eq!(value["stats"]["differing"], 1);
    }

    #[test]
    fn test_json_identical_when_requested() {
        let json = render_json(&sample(), &RenderOptions { show_identical: true }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["identical"][0], "a.txt");
    }
}
