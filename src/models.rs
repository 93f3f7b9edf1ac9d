//! Data models for the bike-sharing dashboard.
//!
//! This module contains the usage record read from the dataset, the
//! categorical dimensions it is grouped by, the rows of every aggregated
//! table, and the report that ties them together.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Calendar month label.
///
/// Ordering is calendar order (see [`Month::rank`]), never alphabetical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

/// Month label → calendar rank, also used when parsing.
const MONTH_ORDER: [(Month, &str, &str, u8); 12] = [
    (Month::Jan, "jan", "january", 1),
    (Month::Feb, "feb", "february", 2),
    (Month::Mar, "mar", "march", 3),
    (Month::Apr, "apr", "april", 4),
    (Month::May, "may", "may", 5),
    (Month::Jun, "jun", "june", 6),
    (Month::Jul, "jul", "july", 7),
    (Month::Aug, "aug", "august", 8),
    (Month::Sep, "sep", "september", 9),
    (Month::Oct, "oct", "october", 10),
    (Month::Nov, "nov", "november", 11),
    (Month::Dec, "dec", "december", 12),
];

impl Month {
    /// All months in calendar order.
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Calendar rank, 1 for January through 12 for December.
    pub fn rank(&self) -> u8 {
        MONTH_ORDER
            .iter()
            .find(|(month, ..)| month == self)
            .map(|(.., rank)| *rank)
            .unwrap_or(0)
    }

    /// Three-letter label as it appears in the dataset.
    pub fn abbrev(&self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    /// Full English month name.
    pub fn full_name(&self) -> &'static str {
        match self {
            Month::Jan => "January",
            Month::Feb => "February",
            Month::Mar => "March",
            Month::Apr => "April",
            Month::May => "May",
            Month::Jun => "June",
            Month::Jul => "July",
            Month::Aug => "August",
            Month::Sep => "September",
            Month::Oct => "October",
            Month::Nov => "November",
            Month::Dec => "December",
        }
    }
}

impl PartialOrd for Month {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Month {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbrev())
    }
}

impl FromStr for Month {
    type Err = String;

    /// Accepts "Jan", "january", "JAN" or a month number "1".."12".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();

        if let Ok(number) = normalized.parse::<u8>() {
            return MONTH_ORDER
                .iter()
                .find(|(.., rank)| *rank == number)
                .map(|(month, ..)| *month)
                .ok_or_else(|| format!("month number must be between 1 and 12, got {}", number));
        }

        MONTH_ORDER
            .iter()
            .find(|(_, short, long, _)| normalized == *short || normalized == *long)
            .map(|(month, ..)| *month)
            .ok_or_else(|| "unknown month label".to_string())
    }
}

/// Calendar season label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// All seasons in the order they are reported.
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Returns an emoji representation of the season.
    pub fn emoji(&self) -> &'static str {
        match self {
            Season::Spring => "🌸",
            Season::Summer => "☀️",
            Season::Fall => "🍂",
            Season::Winter => "❄️",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Spring => write!(f, "Spring"),
            Season::Summer => write!(f, "Summer"),
            Season::Fall => write!(f, "Fall"),
            Season::Winter => write!(f, "Winter"),
        }
    }
}

impl FromStr for Season {
    type Err = String;

    /// Accepts season names ("fall" and "autumn" are synonyms) or the
    /// numeric codes 1-4 used by the raw bike-sharing export.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spring" | "1" => Ok(Season::Spring),
            "summer" | "2" => Ok(Season::Summer),
            "fall" | "autumn" | "3" => Ok(Season::Fall),
            "winter" | "4" => Ok(Season::Winter),
            _ => Err("unknown season label".to_string()),
        }
    }
}

/// One hourly observation of bike-sharing activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Calendar date of the observation.
    pub date: NaiveDate,
    /// Year of the observation.
    pub year: i32,
    /// Month label.
    pub month: Month,
    /// Hour of day, 0-23.
    pub hour: u8,
    /// Season label.
    pub season: Season,
    /// Weather category label.
    pub weather: String,
    /// Whether the day is a working day.
    pub workingday: bool,
    /// Temperature.
    pub temp: f64,
    /// Rentals by casual users.
    pub casual: u64,
    /// Rentals by registered users.
    pub registered: u64,
    /// All rentals; equals `casual + registered`.
    pub total_count: u64,
}

/// Summed rental counts of a group of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub casual: u64,
    pub registered: u64,
    pub total_count: u64,
}

impl Counts {
    /// Adds one record's counts. Sums saturate at `u64::MAX`.
    pub fn add(&mut self, record: &UsageRecord) {
        self.casual = self.casual.saturating_add(record.casual);
        self.registered = self.registered.saturating_add(record.registered);
        self.total_count = self.total_count.saturating_add(record.total_count);
    }

    /// Adds another group's counts. Sums saturate at `u64::MAX`.
    pub fn merge(&mut self, other: &Counts) {
        self.casual = self.casual.saturating_add(other.casual);
        self.registered = self.registered.saturating_add(other.registered);
        self.total_count = self.total_count.saturating_add(other.total_count);
    }

    /// Whether `casual + registered == total_count`.
    pub fn is_consistent(&self) -> bool {
        self.casual.checked_add(self.registered) == Some(self.total_count)
    }
}

/// Rentals per calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: Month,
    #[serde(flatten)]
    pub counts: Counts,
}

/// Rentals per (year, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearMonthTotal {
    pub year: i32,
    pub month: Month,
    #[serde(flatten)]
    pub counts: Counts,
}

impl YearMonthTotal {
    /// Label such as "2011-Jan".
    pub fn label(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }
}

/// Mean and sum of rentals per (month, working day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthWorkingdayStats {
    pub month: Month,
    pub workingday: bool,
    /// Number of records in the group.
    pub records: usize,
    /// Mean `total_count` per record.
    pub mean_total: f64,
    /// Summed `total_count`.
    pub sum_total: u64,
}

/// Rentals per hour of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyTotal {
    pub hour: u8,
    #[serde(flatten)]
    pub counts: Counts,
}

/// Rentals per (season, year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonYearTotal {
    pub season: Season,
    pub year: i32,
    #[serde(flatten)]
    pub counts: Counts,
}

/// Mean temperature and rentals per (date, season).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalDay {
    pub date: NaiveDate,
    pub season: Season,
    pub mean_temp: f64,
    #[serde(flatten)]
    pub counts: Counts,
}

/// Rentals per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: Counts,
}

/// Mean daily rentals over one Monday-Sunday week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAverage {
    /// The Sunday closing the week.
    pub week_ending: NaiveDate,
    /// Days of the week present in the daily series.
    pub days: usize,
    pub mean_total: f64,
    pub mean_casual: f64,
    pub mean_registered: f64,
}

/// Grand totals over the whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallTotals {
    pub records: usize,
    #[serde(flatten)]
    pub counts: Counts,
}

/// Highest and lowest month by total rentals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthExtremes {
    pub highest: MonthlyTotal,
    pub lowest: MonthlyTotal,
}

/// One equal-width temperature bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Mean per-record rentals of one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonMean {
    pub season: Season,
    pub records: usize,
    pub mean_total: f64,
}

/// Number of records observed under one weather label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCount {
    pub weather: String,
    pub records: usize,
}

/// Five-number summary of temperature under one weather label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTemperature {
    pub weather: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Number of records per (season, weather).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonWeatherCount {
    pub season: Season,
    pub weather: String,
    pub records: usize,
}

/// Pearson correlation of temperature against each count column.
///
/// `None` when a column has zero variance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureCorrelation {
    pub total_count: Option<f64>,
    pub casual: Option<f64>,
    pub registered: Option<f64>,
}

/// Breakdowns beyond the main trend tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraInsights {
    pub temperature_histogram: Vec<HistogramBin>,
    pub season_means: Vec<SeasonMean>,
    pub weather_counts: Vec<WeatherCount>,
    pub weather_temperature: Vec<WeatherTemperature>,
    pub season_weather_counts: Vec<SeasonWeatherCount>,
    pub temperature_correlation: TemperatureCorrelation,
}

/// A headed list of narrative observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub heading: String,
    pub points: Vec<String>,
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report title.
    pub title: String,
    /// Path of the dataset the report was built from.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of usage records.
    pub records: usize,
    /// Earliest date in the dataset.
    pub first_date: NaiveDate,
    /// Latest date in the dataset.
    pub last_date: NaiveDate,
    /// Time spent loading and aggregating, in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub totals: OverallTotals,
    pub monthly: Vec<MonthlyTotal>,
    pub month_extremes: MonthExtremes,
    pub yearly_monthly: Vec<YearMonthTotal>,
    pub monthly_workingday: Vec<MonthWorkingdayStats>,
    pub hourly: Vec<HourlyTotal>,
    pub best_hour: u8,
    pub worst_hour: u8,
    pub season_year: Vec<SeasonYearTotal>,
    pub seasonal_daily: Vec<SeasonalDay>,
    pub daily: Vec<DailyTotal>,
    pub weekly: Vec<WeeklyAverage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<ExtraInsights>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub narrative: Vec<Narrative>,
}
