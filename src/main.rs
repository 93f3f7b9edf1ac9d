//! BikeDash - bike-sharing usage dashboard
//!
//! A CLI tool that loads an hourly bike-sharing usage dataset,
//! aggregates it along calendar, time-of-day and season dimensions,
//! and generates a Markdown or JSON dashboard report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, malformed data, write failure, etc.)
//!   3 - No data (dataset file missing or unreadable)

mod analysis;
mod cli;
mod config;
mod data;
mod error;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use data::LoadOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;
use models::Report;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit code used when there is no data to show.
const EXIT_NO_DATA: i32 = 3;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides the default verbosity, so it is read first
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("BikeDash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    // Run the dashboard
    match run_dashboard(&args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .bikedash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the dataset path, report sections, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete dashboard workflow. Returns the exit code.
fn run_dashboard(args: &Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();
    config.validate()?;

    // Step 1: Load the dataset
    let data_path = config.data.path.clone();
    status(args, format_args!("📥 Loading dataset: {}", data_path.display()));

    let load_options = LoadOptions {
        show_progress: !args.quiet,
        ..LoadOptions::default()
    };

    let dataset = match data::load_dataset(&data_path, &load_options) {
        Ok(dataset) => dataset,
        Err(e) if e.is_load_failure() => {
            warn!("{}", e);
            eprintln!("\n⚠️  Failed to load data. File not found or unreadable.");
            eprintln!("   Expected a CSV dataset at: {}", data_path.display());
            return Ok(EXIT_NO_DATA);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Invalid dataset {}", data_path.display()));
        }
    };

    // Step 2: Aggregate
    status(args, format_args!("🔬 Aggregating {} records...", dataset.len()));
    let mut report = report::build_report(&dataset, &config.report)?;

    // Step 3: Render
    report.metadata.duration_seconds = start_time.elapsed().as_secs_f64();

    let output = render_report(args.format, &report, &config)?;

    if args.stdout {
        println!("{}", output);
        return Ok(0);
    }

    let output_path = resolve_output_path(args, &config);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    if !args.quiet {
        let totals = &report.totals.counts;
        println!("\n📊 Dashboard Summary:");
        println!(
            "   Period: {} to {}",
            report.metadata.first_date, report.metadata.last_date
        );
        println!(
            "   Total users: {} (casual {} | registered {})",
            report::format::format_count(totals.total_count),
            report::format::format_count(totals.casual),
            report::format::format_count(totals.registered)
        );
        println!(
            "   Busiest month: {} | Quietest month: {}",
            report.month_extremes.highest.month.full_name(),
            report.month_extremes.lowest.month.full_name()
        );
        println!(
            "   Best hour: {} | Worst hour: {}",
            report::format::format_hour(report.best_hour),
            report::format::format_hour(report.worst_hour)
        );
        println!("   Duration: {:.2}s", report.metadata.duration_seconds);
    }
    println!(
        "\n✅ Dashboard complete! Report saved to: {}",
        output_path.display()
    );

    Ok(0)
}

/// Render the report in the requested format.
fn render_report(format: OutputFormat, report: &Report, config: &Config) -> Result<String> {
    match format {
        OutputFormat::Json => report::generate_json_report(report),
        OutputFormat::Markdown => Ok(report::generate_markdown_report(report, &config.report)),
    }
}

/// Where progress lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusStream {
    Stdout,
    /// stdout carries the report itself
    Stderr,
    Silent,
}

fn status_stream(args: &Args) -> StatusStream {
    if args.quiet {
        StatusStream::Silent
    } else if args.stdout {
        StatusStream::Stderr
    } else {
        StatusStream::Stdout
    }
}

/// Print a progress line unless it would mix with the report or `--quiet` is set.
fn status(args: &Args, message: std::fmt::Arguments<'_>) {
    match status_stream(args) {
        StatusStream::Stdout => println!("{}", message),
        StatusStream::Stderr => eprintln!("{}", message),
        StatusStream::Silent => {}
    }
}

/// Pick the output path, switching the default file to `.json` for JSON output.
fn resolve_output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    if args.output.is_none()
        && args.format == OutputFormat::Json
        && path.extension().is_some_and(|ext| ext == "md")
    {
        return path.with_extension("json");
    }
    path
}

/// Load configuration from file or use defaults.
///
/// Returns the configuration and the file it came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(DEFAULT_CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("Warning: failed to load config: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_resolve_output_path_default() {
        let args = make_args();
        let config = Config::default();
        assert_eq!(
            resolve_output_path(&args, &config),
            PathBuf::from("bike_sharing_report.md")
        );
    }

    #[test]
    fn test_resolve_output_path_json_default() {
        let mut args = make_args();
        args.format = OutputFormat::Json;
        let config = Config::default();
        assert_eq!(
            resolve_output_path(&args, &config),
            PathBuf::from("bike_sharing_report.json")
        );
    }

    #[test]
    fn test_resolve_output_path_explicit_is_kept() {
        let mut args = make_args();
        args.format = OutputFormat::Json;
        args.output = Some(PathBuf::from("out.md"));
        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(resolve_output_path(&args, &config), PathBuf::from("out.md"));
    }

    #[test]
    fn test_status_stream_keeps_stdout_for_the_report() {
        let mut args = make_args();
        assert_eq!(status_stream(&args), StatusStream::Stdout);

        args.stdout = true;
        args.format = OutputFormat::Json;
        assert_eq!(status_stream(&args), StatusStream::Stderr);

        args.quiet = true;
        assert_eq!(status_stream(&args), StatusStream::Silent);
    }

    #[test]
    fn test_json_output_is_only_the_report() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/hour_sample.csv"));
        let dataset = data::load_dataset(path, &LoadOptions::default()).unwrap();
        let config = Config::default();
        let report = report::build_report(&dataset, &config.report).unwrap();

        let output = render_report(OutputFormat::Json, &report, &config).unwrap();

        assert!(output.starts_with('{'));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["metadata"]["records"], 40);
        assert_eq!(value["best_hour"], 18);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let mut args = make_args();
        args.config = Some(PathBuf::from("/nonexistent/bikedash.toml"));
        assert!(load_config(&args).is_err());
    }
}
