//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// BikeDash - bike-sharing usage dashboard
///
/// Load a bike-sharing usage CSV, aggregate it by month, year, hour,
/// season and week, and write a Markdown or JSON dashboard report.
///
/// Examples:
///   bikedash
///   bikedash --data data/main_data.csv --output report.md
///   bikedash --format json --stdout
///   bikedash --bins 12 --no-extras
///   bikedash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the usage dataset (CSV with header)
    ///
    /// Defaults to data/main_data.csv or the [data] path in .bikedash.toml.
    #[arg(short, long, value_name = "FILE", env = "BIKEDASH_DATA")]
    pub data: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE", conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Print the report to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bikedash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of temperature histogram bins
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,

    /// Width of text bar charts in characters
    #[arg(long, value_name = "N")]
    pub bar_width: Option<usize>,

    /// Leave out the narrative analysis sections
    #[arg(long)]
    pub no_narrative: bool,

    /// Leave out temperature, weather and season breakdowns
    #[arg(long)]
    pub no_extras: bool,

    /// Include the full per-day table
    #[arg(long)]
    pub include_daily: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .bikedash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.bins == Some(0) {
            return Err("Histogram bins must be at least 1".to_string());
        }

        if self.bar_width == Some(0) {
            return Err("Bar width must be at least 1".to_string());
        }

        if let Some(ref data) = self.data {
            if data.is_dir() {
                return Err(format!("Data path is a directory: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            data: None,
            output: None,
            format: OutputFormat::Markdown,
            stdout: false,
            config: None,
            bins: None,
            bar_width: None,
            no_narrative: false,
            no_extras: false,
            include_daily: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["bikedash"]).unwrap();
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(args.output.is_none());
        assert!(!args.stdout);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "bikedash",
            "--data",
            "hour.csv",
            "--format",
            "json",
            "--bins",
            "12",
            "--no-extras",
        ])
        .unwrap();

        assert_eq!(args.data, Some(PathBuf::from("hour.csv")));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.bins, Some(12));
        assert!(args.no_extras);
    }

    #[test]
    fn test_stdout_conflicts_with_output() {
        let result = Args::try_parse_from(["bikedash", "--stdout", "--output", "r.md"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_bins() {
        let mut args = make_args();
        args.bins = Some(0);
        assert!(args.validate().is_err());

        args.bins = Some(5);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
