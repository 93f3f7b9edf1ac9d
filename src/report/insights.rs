//! Narrative text derived from the aggregated tables.
//!
//! Each section states what the numbers show: peaks, lows, growth and
//! comparisons. Nothing here is hard-coded to a particular dataset.

use crate::models::{
    DailyTotal, HourlyTotal, MonthExtremes, MonthWorkingdayStats, Month, MonthlyTotal, Narrative,
    Report, Season, SeasonYearTotal, WeeklyAverage, YearMonthTotal,
};
use crate::report::format::{
    format_count, format_decimal, format_hour, format_percent, percent_change,
};
use std::collections::BTreeMap;

/// Headings used both here and by the generator to place each narrative.
pub const MONTHLY: &str = "Monthly";
pub const YEARLY: &str = "Yearly";
pub const WORKING_DAY: &str = "Working Day";
pub const HOURLY: &str = "Hourly";
pub const SEASONAL: &str = "Seasonal";
pub const TREND: &str = "Trend";

/// Build every narrative section for a report.
pub fn narrate(report: &Report) -> Vec<Narrative> {
    vec![
        monthly_narrative(&report.monthly, &report.month_extremes),
        yearly_narrative(&report.yearly_monthly),
        workingday_narrative(&report.monthly_workingday),
        hourly_narrative(&report.hourly, report.best_hour, report.worst_hour),
        seasonal_narrative(&report.season_year),
        trend_narrative(&report.daily, &report.weekly),
    ]
    .into_iter()
    .filter(|n| !n.points.is_empty())
    .collect()
}

fn monthly_narrative(monthly: &[MonthlyTotal], extremes: &MonthExtremes) -> Narrative {
    let mut points = vec![
        format!(
            "Usage peaks in {} with {} rentals.",
            extremes.highest.month.full_name(),
            format_count(extremes.highest.counts.total_count)
        ),
        format!(
            "{} is the quietest month with {} rentals.",
            extremes.lowest.month.full_name(),
            format_count(extremes.lowest.counts.total_count)
        ),
    ];

    if let (Some(first), Some(last)) = (monthly.first(), monthly.last()) {
        let peak = &extremes.highest;
        if peak.month != first.month {
            if let Some(change) = percent_change(
                first.counts.total_count as f64,
                peak.counts.total_count as f64,
            ) {
                points.push(format!(
                    "From {} to {} rentals change by {}.",
                    first.month.full_name(),
                    peak.month.full_name(),
                    format_percent(change)
                ));
            }
        }
        if peak.month != last.month {
            if let Some(change) = percent_change(
                peak.counts.total_count as f64,
                last.counts.total_count as f64,
            ) {
                points.push(format!(
                    "After the peak, rentals change by {} through {}.",
                    format_percent(change),
                    last.month.full_name()
                ));
            }
        }
    }

    Narrative {
        heading: MONTHLY.to_string(),
        points,
    }
}

fn yearly_narrative(yearly_monthly: &[YearMonthTotal]) -> Narrative {
    let mut points = Vec::new();

    let mut by_year: BTreeMap<i32, u64> = BTreeMap::new();
    let mut by_month: BTreeMap<Month, BTreeMap<i32, u64>> = BTreeMap::new();
    for row in yearly_monthly {
        let year_total = by_year.entry(row.year).or_default();
        *year_total = year_total.saturating_add(row.counts.total_count);
        by_month
            .entry(row.month)
            .or_default()
            .insert(row.year, row.counts.total_count);
    }

    let first_year = by_year.iter().next();
    let last_year = by_year.iter().next_back();
    if let (Some((&from_year, &from_total)), Some((&to_year, &to_total))) = (first_year, last_year) {
        if from_year != to_year {
            if let Some(change) = percent_change(from_total as f64, to_total as f64) {
                points.push(format!(
                    "Total rentals change by {} from {} ({}) to {} ({}).",
                    format_percent(change),
                    from_year,
                    format_count(from_total),
                    to_year,
                    format_count(to_total)
                ));
            }

            let compared: Vec<(u64, u64)> = by_month
                .values()
                .filter_map(|years| Some((*years.get(&from_year)?, *years.get(&to_year)?)))
                .collect();
            if !compared.is_empty() {
                let higher = compared.iter().filter(|(from, to)| to > from).count();
                points.push(format!(
                    "{} is higher than {} in {} of {} comparable months.",
                    to_year,
                    from_year,
                    higher,
                    compared.len()
                ));
            }
        }
    }

    if let Some(best) = yearly_monthly
        .iter()
        .reduce(|best, row| if row.counts.total_count > best.counts.total_count { row } else { best })
    {
        points.push(format!(
            "The busiest single month is {} with {} rentals.",
            best.label(),
            format_count(best.counts.total_count)
        ));
    }

    Narrative {
        heading: YEARLY.to_string(),
        points,
    }
}

fn workingday_narrative(stats: &[MonthWorkingdayStats]) -> Narrative {
    let mut points = Vec::new();

    let mut months: BTreeMap<Month, (Option<f64>, Option<f64>)> = BTreeMap::new();
    let (mut working_sum, mut other_sum) = (0u64, 0u64);
    let (mut working_records, mut other_records) = (0usize, 0usize);
    for row in stats {
        let entry = months.entry(row.month).or_default();
        if row.workingday {
            entry.0 = Some(row.mean_total);
            working_sum = working_sum.saturating_add(row.sum_total);
            working_records += row.records;
        } else {
            entry.1 = Some(row.mean_total);
            other_sum = other_sum.saturating_add(row.sum_total);
            other_records += row.records;
        }
    }

    let mut off_day_months = Vec::new();
    let mut compared = 0;
    for (month, means) in &months {
        if let (Some(working), Some(other)) = means {
            compared += 1;
            if other > working {
                off_day_months.push(month.abbrev());
            }
        }
    }
    if compared > 0 {
        if off_day_months.is_empty() {
            points.push(
                "Average usage is higher on working days in every month.".to_string(),
            );
        } else {
            points.push(format!(
                "Average usage is higher on non-working days in {} of {} months: {}.",
                off_day_months.len(),
                compared,
                off_day_months.join(", ")
            ));
        }
    }

    if working_records > 0 && other_records > 0 {
        points.push(format!(
            "Mean rentals per record: {} on working days vs {} on non-working days.",
            format_decimal(working_sum as f64 / working_records as f64, 1),
            format_decimal(other_sum as f64 / other_records as f64, 1)
        ));
    }

    let grand = working_sum.saturating_add(other_sum);
    if grand > 0 {
        points.push(format!(
            "Working days account for {} rentals ({:.1}% of the total).",
            format_count(working_sum),
            working_sum as f64 / grand as f64 * 100.0
        ));
    }

    Narrative {
        heading: WORKING_DAY.to_string(),
        points,
    }
}

fn hourly_narrative(hourly: &[HourlyTotal], best_hour: u8, worst_hour: u8) -> Narrative {
    let total_at = |hour: u8| {
        hourly
            .iter()
            .find(|row| row.hour == hour)
            .map(|row| row.counts.total_count)
            .unwrap_or(0)
    };

    let mut points = vec![
        format!(
            "The best performing hour is {} with {} rentals.",
            format_hour(best_hour),
            format_count(total_at(best_hour))
        ),
        format!(
            "The worst performing hour is {} with {} rentals.",
            format_hour(worst_hour),
            format_count(total_at(worst_hour))
        ),
    ];

    let peak_in = |range: std::ops::Range<u8>| {
        hourly
            .iter()
            .filter(|row| range.contains(&row.hour))
            .reduce(|best, row| if row.counts.total_count > best.counts.total_count { row } else { best })
    };
    if let (Some(morning), Some(evening)) = (peak_in(0..12), peak_in(12..24)) {
        points.push(format!(
            "Morning usage peaks at {} ({}), evening usage at {} ({}).",
            format_hour(morning.hour),
            format_count(morning.counts.total_count),
            format_hour(evening.hour),
            format_count(evening.counts.total_count)
        ));
    }

    Narrative {
        heading: HOURLY.to_string(),
        points,
    }
}

fn seasonal_narrative(season_year: &[SeasonYearTotal]) -> Narrative {
    let mut points = Vec::new();

    let mut by_season: BTreeMap<Season, BTreeMap<i32, u64>> = BTreeMap::new();
    for row in season_year {
        by_season
            .entry(row.season)
            .or_default()
            .insert(row.year, row.counts.total_count);
    }

    if let Some((season, total)) = by_season
        .iter()
        .map(|(season, years)| {
            let total = years.values().fold(0u64, |acc, v| acc.saturating_add(*v));
            (*season, total)
        })
        .reduce(|best, item| if item.1 > best.1 { item } else { best })
    {
        points.push(format!(
            "{} {} is the busiest season with {} rentals across all years.",
            season.emoji(),
            season,
            format_count(total)
        ));
    }

    for (season, years) in &by_season {
        let first = years.iter().next();
        let last = years.iter().next_back();
        if let (Some((from_year, &from)), Some((to_year, &to))) = (first, last) {
            if from_year == to_year {
                continue;
            }
            if let Some(change) = percent_change(from as f64, to as f64) {
                points.push(format!(
                    "{} rentals change by {} from {} ({}) to {} ({}).",
                    season,
                    format_percent(change),
                    from_year,
                    format_count(from),
                    to_year,
                    format_count(to)
                ));
            }
        }
    }

    Narrative {
        heading: SEASONAL.to_string(),
        points,
    }
}

fn trend_narrative(daily: &[DailyTotal], weekly: &[WeeklyAverage]) -> Narrative {
    let mut points = Vec::new();

    let busiest = daily
        .iter()
        .reduce(|best, d| if d.counts.total_count > best.counts.total_count { d } else { best });
    let quietest = daily
        .iter()
        .reduce(|low, d| if d.counts.total_count < low.counts.total_count { d } else { low });
    if let (Some(busiest), Some(quietest)) = (busiest, quietest) {
        points.push(format!(
            "The busiest day is {} with {} rentals; the quietest is {} with {}.",
            busiest.date,
            format_count(busiest.counts.total_count),
            quietest.date,
            format_count(quietest.counts.total_count)
        ));
    }

    if let Some(week) = weekly
        .iter()
        .reduce(|best, w| if w.mean_total > best.mean_total { w } else { best })
    {
        points.push(format!(
            "Across {} weeks, the strongest week ends {} with {} rentals per day on average.",
            weekly.len(),
            week.week_ending,
            format_decimal(week.mean_total, 1)
        ));
    }

    Narrative {
        heading: TREND.to_string(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::sample_dataset;
    use crate::config::ReportConfig;
    use crate::report::build_report;

    fn section<'a>(narrative: &'a [Narrative], heading: &str) -> &'a Narrative {
        narrative
            .iter()
            .find(|n| n.heading == heading)
            .unwrap_or_else(|| panic!("missing section {heading}"))
    }

    #[test]
    fn test_narrate_covers_every_section() {
        let report = build_report(&sample_dataset(), &ReportConfig::default()).unwrap();

        let narrative = narrate(&report);

        for heading in [MONTHLY, YEARLY, WORKING_DAY, HOURLY, SEASONAL, TREND] {
            assert!(!section(&narrative, heading).points.is_empty());
        }
    }

    #[test]
    fn test_monthly_narrative_names_extremes() {
        let report = build_report(&sample_dataset(), &ReportConfig::default()).unwrap();

        let monthly = section(&report.narrative, MONTHLY);

        // Rentals grow with the month number in the sample data
        assert!(monthly.points[0].contains("December"));
        assert!(monthly.points[1].contains("January"));
    }

    #[test]
    fn test_yearly_narrative_reports_growth() {
        let report = build_report(&sample_dataset(), &ReportConfig::default()).unwrap();

        let yearly = section(&report.narrative, YEARLY);

        assert!(yearly.points[0].contains("from 2011"));
        assert!(yearly.points[0].contains('+'));
        assert!(yearly.points[1].contains("12 of 12"));
        assert!(yearly.points[2].contains("2012-Dec"));
    }

    #[test]
    fn test_hourly_narrative() {
        let report = build_report(&sample_dataset(), &ReportConfig::default()).unwrap();

        let hourly = section(&report.narrative, HOURLY);

        assert!(hourly.points[0].contains("23:00"));
        assert!(hourly.points[1].contains("00:00"));
        assert!(hourly.points[2].contains("Morning usage peaks at 08:00"));
    }

    #[test]
    fn test_workingday_narrative_single_kind() {
        let stats = vec![MonthWorkingdayStats {
            month: Month::Jan,
            workingday: true,
            records: 2,
            mean_total: 10.0,
            sum_total: 20,
        }];

        let narrative = workingday_narrative(&stats);

        // Nothing to compare against, only the share is reported
        assert_eq!(narrative.points.len(), 1);
        assert!(narrative.points[0].contains("100.0%"));
    }
}
