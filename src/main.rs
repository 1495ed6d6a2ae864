//! dircompare - Compare two directory trees and report what differs.
//!
//! Usage:
//!   compare_directories LEFT RIGHT             Metadata comparison, text report
//!   compare_directories LEFT RIGHT --deep      Also compare file contents
//!   compare_directories LEFT RIGHT --output json
//!   compare_directories --help                 Show help
//!
//! Exit codes: 0 identical, 1 differences, 2 invalid input, 3 fatal error.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing::{Level, debug};

use dircompare_analyze::{DirectoryComparator, RenderOptions, render_json, render_text};
use dircompare_core::{CompareConfig, CompareError, DeepMethod, ExitStatus};

#[derive(Debug, Parser)]
#[command(
    name = "compare_directories",
    version,
    about = "Compare two directory trees and report what differs",
    long_about = "Walks both directories and reports paths present only on the left, \
                  only on the right, and present on both sides but differing.\n\n\
                  Exit status is 0 when the trees are identical, 1 when differences \
                  were found, 2 for invalid arguments or roots, and 3 for fatal I/O \
                  errors or an incomplete comparison."
)]
struct Cli {
    /// Left directory
    left: PathBuf,

    /// Right directory
    right: PathBuf,

    /// Compare file contents when size and modification time match
    #[arg(short, long)]
    deep: bool,

    /// How file contents are compared in deep mode
    #[arg(long, value_enum, default_value = "bytes")]
    deep_method: DeepMethodArg,

    /// Follow symbolic links instead of comparing link targets
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    output_file: Option<PathBuf>,

    /// Do not compare modification times
    #[arg(long)]
    ignore_times: bool,

    /// Treat modification times within this distance as equal (e.g. "2s", "500ms")
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, default_value = "0")]
    mtime_tolerance: Duration,

    /// Exclude paths matching a glob pattern (repeatable)
    #[arg(short, long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Match files present on only one side by content to find moves
    #[arg(long)]
    match_content: bool,

    /// Also list identical paths
    #[arg(long)]
    show_identical: bool,

    /// Give up after this long and report the comparison as incomplete (e.g. "30s", "5m")
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Worker threads (0 = one per CPU)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Disable logging
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum DeepMethodArg {
    #[default]
    Bytes,
    Hash,
}

impl From<DeepMethodArg> for DeepMethod {
    fn from(arg: DeepMethodArg) -> Self {
        match arg {
            DeepMethodArg::Bytes => DeepMethod::Bytes,
            DeepMethodArg::Hash => DeepMethod::Hash,
        }
    }
}

impl Cli {
    fn log_level(&self) -> Option<Level> {
        if self.quiet {
            return None;
        }
        Some(match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        })
    }

    fn compare_config(&self) -> Result<CompareConfig> {
        CompareConfig::builder()
            .left(self.left.clone())
            .right(self.right.clone())
            .follow_symlinks(self.follow_symlinks)
            .deep(self.deep)
            .deep_method(DeepMethod::from(self.deep_method))
            .ignore_times(self.ignore_times)
            .mtime_tolerance(self.mtime_tolerance)
            .exclude_patterns(self.exclude.clone())
            .match_content(self.match_content)
            .threads(self.threads)
            .timeout(self.timeout)
            .build()
            .map_err(|e| CompareError::InvalidConfig {
                message: e.to_string(),
            })
            .context("Invalid arguments")
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(&cli);

    if let Err(err) = color_eyre::install() {
        eprintln!("Error: {err:?}");
        return ExitCode::from(ExitStatus::Fatal.code());
    }
    debug!("Parsed CLI arguments: {cli:?}");

    match run(&cli) {
        Ok(status) => ExitCode::from(status.code()),
        Err(report) => {
            eprintln!("Error: {report:?}");
            let status = report
                .downcast_ref::<CompareError>()
                .map_or(ExitStatus::Fatal, CompareError::exit_status);
            ExitCode::from(status.code())
        }
    }
}

fn setup_tracing(cli: &Cli) {
    if let Some(level) = cli.log_level() {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .without_time()
            .compact()
            .init();
    }
}

/// Compare the two roots and write the report.
fn run(cli: &Cli) -> Result<ExitStatus> {
    let config = cli.compare_config()?;
    let comparator = DirectoryComparator::new(config);
    let result = comparator.compare().context("Comparison failed")?;

    let options = RenderOptions {
        show_identical: cli.show_identical,
    };
    let report = match cli.output {
        OutputFormat::Text => render_text(&result, &options),
        OutputFormat::Json => {
            let mut json = render_json(&result, &options).context("Failed to serialize report")?;
            json.push('\n');
            json
        }
    };

    match &cli.output_file {
        Some(path) => {
            std::fs::write(path, report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => print!("{report}"),
    }

    Ok(result.exit_status())
}

/// Parse a duration string (e.g., "500ms", "30s", "5m", "1h"). Bare numbers are seconds.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    // Seconds per unit, as a fraction so milliseconds stay exact.
    let (num, multiplier, divisor) = if let Some(num) = s.strip_suffix("ms") {
        (num, 1.0, 1000.0)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, 1.0, 1.0)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60.0, 1.0)
    } else if let Some(num) = s.strip_suffix('h') {
        (num, 60.0 * 60.0, 1.0)
    } else {
        (s.as_str(), 1.0, 1.0)
    };

    let num: f64 = num
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration: {s:?}"))?;
    if !num.is_finite() || num < 0.0 {
        return Err(format!("duration must be a non-negative number: {s:?}"));
    }

    Duration::try_from_secs_f64(num * multiplier / divisor)
        .map_err(|e| format!("duration out of range: {s:?} ({e})"))
}
