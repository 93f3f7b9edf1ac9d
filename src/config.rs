//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.bikedash.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".bikedash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "bike_sharing_report.md".to_string()
}

/// Dataset location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the CSV dataset.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/main_data.csv")
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Include the narrative "Analysis" sections.
    #[serde(default = "default_true")]
    pub include_narrative: bool,

    /// Include temperature, weather and season breakdowns.
    #[serde(default = "default_true")]
    pub include_extras: bool,

    /// Include the full per-day table (one row per date).
    #[serde(default)]
    pub include_daily: bool,

    /// Number of temperature histogram bins.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Width of text bar charts, in characters.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            include_narrative: true,
            include_extras: true,
            include_daily: false,
            histogram_bins: default_histogram_bins(),
            bar_width: default_bar_width(),
        }
    }
}

fn default_title() -> String {
    "Bike Sharing Data Visualization".to_string()
}

fn default_true() -> bool {
    true
}

fn default_histogram_bins() -> usize {
    20
}

fn default_bar_width() -> usize {
    40
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(bins) = args.bins {
            self.report.histogram_bins = bins;
        }
        if let Some(width) = args.bar_width {
            self.report.bar_width = width;
        }

        // Flags only ever switch sections off or on relative to the file
        if args.no_narrative {
            self.report.include_narrative = false;
        }
        if args.no_extras {
            self.report.include_extras = false;
        }
        if args.include_daily {
            self.report.include_daily = true;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values the report builder relies on.
    pub fn validate(&self) -> Result<()> {
        if self.report.histogram_bins == 0 {
            anyhow::bail!("report.histogram_bins must be at least 1");
        }
        if self.report.bar_width == 0 {
            anyhow::bail!("report.bar_width must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
