//! Weekly resampling of the daily series.
//!
//! Weeks run Monday through Sunday and are labelled by their closing Sunday.
//! A week's row averages the daily rows that fall inside it, so partial
//! weeks at either end of the series are averaged over the days present.
//! Weeks with no daily rows (gaps in the series) produce no row.

use crate::error::{AnalysisResult, StructuralError};
use crate::models::{Counts, DailyTotal, WeeklyAverage};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// The Sunday closing the week that contains `date`.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let offset = 6 - date.weekday().num_days_from_monday();
    date.checked_add_days(Days::new(offset as u64))
        .unwrap_or(NaiveDate::MAX)
}

/// Mean daily rentals per calendar week.
pub fn weekly_trend(daily: &[DailyTotal]) -> AnalysisResult<Vec<WeeklyAverage>> {
    if daily.is_empty() {
        return Err(StructuralError::EmptyInput {
            operation: "weekly_trend",
        });
    }

    let mut weeks: BTreeMap<NaiveDate, (usize, Counts)> = BTreeMap::new();
    for day in daily {
        let entry = weeks.entry(week_ending(day.date)).or_default();
        entry.0 += 1;
        entry.1.merge(&day.counts);
    }

    let weekly: Vec<WeeklyAverage> = weeks
        .into_iter()
        .map(|(week_ending, (days, counts))| {
            let n = days as f64;
            WeeklyAverage {
                week_ending,
                days,
                mean_total: counts.total_count as f64 / n,
                mean_casual: counts.casual as f64 / n,
                mean_registered: counts.registered as f64 / n,
            }
        })
        .collect();

    debug!("Resampled {} days into {} weeks", daily.len(), weekly.len());
    Ok(weekly)
}
