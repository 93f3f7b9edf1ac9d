//! Markdown and JSON report generation.
//!
//! This module renders the dashboard report: tables, text bar charts and
//! the narrative analysis for each section.

use crate::config::ReportConfig;
use crate::models::{
    DailyTotal, ExtraInsights, HourlyTotal, Month, MonthWorkingdayStats, MonthlyTotal, Narrative,
    OverallTotals, Report, ReportMetadata, Season, SeasonYearTotal, SeasonalDay, WeeklyAverage,
    YearMonthTotal,
};
use crate::report::format::{anchor, bar, format_count, format_decimal, format_hour};
use crate::report::insights;
use anyhow::Result;
use std::collections::BTreeMap;

const USERS: &str = "Bike Users";
const MONTHLY: &str = "Monthly Bike Sharing Users";
const YEARLY: &str = "Monthly Users by Year";
const WORKING_DAY: &str = "Working Day vs Weekend";
const HOURLY: &str = "Hourly Bike Sharing Users";
const SEASONAL: &str = "Bike Sharing Users by Season";
const TREND: &str = "Daily and Weekly Trend";
const EXTRAS: &str = "Extra Information";

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportConfig) -> String {
    let mut output = String::new();
    let width = options.bar_width;

    // Title
    output.push_str(&format!("# {}\n\n", report.metadata.title));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_totals_section(&report.totals));

    output.push_str(&generate_monthly_section(&report.monthly, report, width));
    output.push_str(&narrative_block(report, insights::MONTHLY));

    output.push_str(&generate_yearly_section(&report.yearly_monthly, width));
    output.push_str(&narrative_block(report, insights::YEARLY));

    output.push_str(&generate_workingday_section(&report.monthly_workingday));
    output.push_str(&narrative_block(report, insights::WORKING_DAY));

    output.push_str(&generate_hourly_section(
        &report.hourly,
        report.best_hour,
        report.worst_hour,
        width,
    ));
    output.push_str(&narrative_block(report, insights::HOURLY));

    output.push_str(&generate_season_section(&report.season_year));
    output.push_str(&narrative_block(report, insights::SEASONAL));

    output.push_str(&generate_trend_section(
        &report.daily,
        &report.weekly,
        options.include_daily,
        width,
    ));
    output.push_str(&narrative_block(report, insights::TREND));

    if let Some(ref extras) = report.extras {
        output.push_str(&generate_extras_section(extras, &report.seasonal_daily, width));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n", format_count(metadata.records as u64)));
    section.push_str(&format!(
        "- **Period:** {} to {}\n",
        metadata.first_date, metadata.last_date
    ));
    section.push_str(&format!(
        "- **Processing Time:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for heading in [USERS, MONTHLY, YEARLY, WORKING_DAY, HOURLY, SEASONAL, TREND] {
        toc.push_str(&format!("- [{}](#{})\n", heading, anchor(heading)));
    }
    if report.extras.is_some() {
        toc.push_str(&format!("- [{}](#{})\n", EXTRAS, anchor(EXTRAS)));
    }
    toc.push('\n');

    toc
}

/// Generate the grand totals section.
fn generate_totals_section(totals: &OverallTotals) -> String {
    let mut section = String::new();
    let counts = &totals.counts;
    let share = |part: u64| {
        if counts.total_count == 0 {
            0.0
        } else {
            part as f64 / counts.total_count as f64 * 100.0
        }
    };

    section.push_str(&format!("## {}\n\n", USERS));
    section.push_str("| 🚲 Total Bike Users | Casual Bike Users | Registered Bike Users |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{}** | {} ({:.1}%) | {} ({:.1}%) |\n\n",
        format_count(counts.total_count),
        format_count(counts.casual),
        share(counts.casual),
        format_count(counts.registered),
        share(counts.registered)
    ));

    section
}

/// Generate the monthly section, calendar order plus a ranking.
fn generate_monthly_section(monthly: &[MonthlyTotal], report: &Report, width: usize) -> String {
    let mut section = String::new();
    let max = monthly
        .iter()
        .map(|m| m.counts.total_count)
        .max()
        .unwrap_or(0) as f64;
    let highest = report.month_extremes.highest.month;
    let lowest = report.month_extremes.lowest.month;
    let marker = |month: Month| {
        if month == highest {
            " 🟢"
        } else if month == lowest {
            " 🔴"
        } else {
            ""
        }
    };

    section.push_str(&format!("## {}\n\n", MONTHLY));
    section.push_str("| Month | Total | Casual | Registered | |\n");
    section.push_str("|:---|---:|---:|---:|:---|\n");
    for row in monthly {
        section.push_str(&format!(
            "| {}{} | {} | {} | {} | `{}` |\n",
            row.month,
            marker(row.month),
            format_count(row.counts.total_count),
            format_count(row.counts.casual),
            format_count(row.counts.registered),
            bar(row.counts.total_count as f64, max, width)
        ));
    }
    section.push_str("\n🟢 Highest performing month · 🔴 Lowest performing month\n\n");

    let mut ranked: Vec<&MonthlyTotal> = monthly.iter().collect();
    ranked.sort_by_key(|row| std::cmp::Reverse(row.counts.total_count));
    section.push_str("### Monthly Performance Ranking\n\n");
    section.push_str(
        &ranked
            .iter()
            .enumerate()
            .map(|(i, row)| format!("{}. {} ({})", i + 1, row.month, format_count(row.counts.total_count)))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    section.push_str("\n\n");

    section
}

/// Generate the year-by-month section.
fn generate_yearly_section(yearly: &[YearMonthTotal], width: usize) -> String {
    let mut section = String::new();
    let max = yearly
        .iter()
        .map(|m| m.counts.total_count)
        .max()
        .unwrap_or(0) as f64;

    section.push_str(&format!("## {}\n\n", YEARLY));
    section.push_str("| Period | Total | |\n");
    section.push_str("|:---|---:|:---|\n");
    for row in yearly {
        section.push_str(&format!(
            "| {} | {} | `{}` |\n",
            row.label(),
            format_count(row.counts.total_count),
            bar(row.counts.total_count as f64, max, width)
        ));
    }
    section.push('\n');

    section
}

/// Generate the working day vs weekend section (mean and sum per month).
fn generate_workingday_section(stats: &[MonthWorkingdayStats]) -> String {
    let mut section = String::new();

    let mut months: BTreeMap<Month, [Option<&MonthWorkingdayStats>; 2]> = BTreeMap::new();
    for row in stats {
        months.entry(row.month).or_default()[row.workingday as usize] = Some(row);
    }

    let mean = |row: Option<&MonthWorkingdayStats>| {
        row.map(|r| format_decimal(r.mean_total, 1))
            .unwrap_or_else(|| "-".to_string())
    };
    let sum = |row: Option<&MonthWorkingdayStats>| {
        row.map(|r| format_count(r.sum_total))
            .unwrap_or_else(|| "-".to_string())
    };

    section.push_str(&format!("## {}\n\n", WORKING_DAY));
    section.push_str("| Month | Mean (working day) | Mean (weekend/holiday) | Sum (working day) | Sum (weekend/holiday) |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");
    for month in Month::ALL {
        let Some([other, working]) = months.get(&month) else {
            continue;
        };
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            month,
            mean(*working),
            mean(*other),
            sum(*working),
            sum(*other)
        ));
    }
    section.push('\n');

    section
}

/// Generate the hourly section with best/worst hour markers.
fn generate_hourly_section(
    hourly: &[HourlyTotal],
    best_hour: u8,
    worst_hour: u8,
    width: usize,
) -> String {
    let mut section = String::new();
    let max = hourly
        .iter()
        .map(|h| h.counts.total_count)
        .max()
        .unwrap_or(0) as f64;

    section.push_str(&format!("## {}\n\n", HOURLY));
    section.push_str(&format!(
        "**Best hour:** {} · **Worst hour:** {}\n\n",
        format_hour(best_hour),
        format_hour(worst_hour)
    ));
    section.push_str("| Hour | Total | |\n");
    section.push_str("|:---|---:|:---|\n");
    for row in hourly {
        let marker = if row.hour == best_hour {
            " ⬆ best"
        } else if row.hour == worst_hour {
            " ⬇ worst"
        } else {
            ""
        };
        section.push_str(&format!(
            "| {} | {} | `{}`{} |\n",
            format_hour(row.hour),
            format_count(row.counts.total_count),
            bar(row.counts.total_count as f64, max, width),
            marker
        ));
    }
    section.push('\n');

    section
}

/// Generate the season × year section as a pivot table.
fn generate_season_section(season_year: &[SeasonYearTotal]) -> String {
    let mut section = String::new();

    let mut years: Vec<i32> = season_year.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();

    let mut pivot: BTreeMap<Season, BTreeMap<i32, u64>> = BTreeMap::new();
    for row in season_year {
        pivot
            .entry(row.season)
            .or_default()
            .insert(row.year, row.counts.total_count);
    }

    section.push_str(&format!("## {}\n\n", SEASONAL));
    section.push_str("| Season |");
    for year in &years {
        section.push_str(&format!(" {} |", year));
    }
    section.push_str(" **Total** |\n|:---|");
    for _ in &years {
        section.push_str("---:|");
    }
    section.push_str("---:|\n");

    for season in Season::ALL {
        let Some(by_year) = pivot.get(&season) else {
            continue;
        };
        section.push_str(&format!("| {} {} |", season.emoji(), season));
        for year in &years {
            match by_year.get(year) {
                Some(total) => section.push_str(&format!(" {} |", format_count(*total))),
                None => section.push_str(" - |"),
            }
        }
        section.push_str(&format!(
            " **{}** |\n",
            format_count(by_year.values().fold(0u64, |acc, v| acc.saturating_add(*v)))
        ));
    }
    section.push('\n');

    section
}

/// Generate the daily/weekly trend section.
fn generate_trend_section(
    daily: &[DailyTotal],
    weekly: &[WeeklyAverage],
    include_daily: bool,
    width: usize,
) -> String {
    let mut section = String::new();
    let max = weekly.iter().map(|w| w.mean_total).fold(0.0, f64::max);

    section.push_str(&format!("## {}\n\n", TREND));
    section.push_str(&format!(
        "{} days grouped into {} Monday-Sunday weeks.\n\n",
        daily.len(),
        weekly.len()
    ));

    section.push_str("### Weekly Trend\n\n");
    section.push_str("| Week ending | Days | Mean rentals/day | |\n");
    section.push_str("|:---|---:|---:|:---|\n");
    for week in weekly {
        section.push_str(&format!(
            "| {} | {} | {} | `{}` |\n",
            week.week_ending,
            week.days,
            format_decimal(week.mean_total, 1),
            bar(week.mean_total, max, width)
        ));
    }
    section.push('\n');

    if include_daily {
        section.push_str("### Daily Totals\n\n");
        section.push_str("| Date | Total | Casual | Registered |\n");
        section.push_str("|:---|---:|---:|---:|\n");
        for day in daily {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                day.date,
                format_count(day.counts.total_count),
                format_count(day.counts.casual),
                format_count(day.counts.registered)
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the extra information section.
fn generate_extras_section(
    extras: &ExtraInsights,
    seasonal_daily: &[SeasonalDay],
    width: usize,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", EXTRAS));

    // Temperature distribution
    let max_bin = extras
        .temperature_histogram
        .iter()
        .map(|b| b.count)
        .max()
        .unwrap_or(0) as f64;
    section.push_str("### Distribution of Temperature\n\n");
    section.push_str("| Temperature | Records | |\n");
    section.push_str("|:---|---:|:---|\n");
    for bin in &extras.temperature_histogram {
        section.push_str(&format!(
            "| {:.2} – {:.2} | {} | `{}` |\n",
            bin.lower,
            bin.upper,
            format_count(bin.count as u64),
            bar(bin.count as f64, max_bin, width)
        ));
    }
    section.push('\n');

    // Mean rentals per season
    section.push_str("### Average Rentals by Season\n\n");
    section.push_str("| Season | Records | Mean total |\n");
    section.push_str("|:---|---:|---:|\n");
    for row in &extras.season_means {
        section.push_str(&format!(
            "| {} {} | {} | {} |\n",
            row.season.emoji(),
            row.season,
            format_count(row.records as u64),
            format_decimal(row.mean_total, 0)
        ));
    }
    section.push('\n');

    section.push_str(&generate_season_temperature_table(seasonal_daily));

    // Weather categories
    section.push_str("### Weather Categories\n\n");
    section.push_str("| Weather | Records | Min temp | Q1 | Median | Q3 | Max temp |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|\n");
    for count in &extras.weather_counts {
        let spread = extras
            .weather_temperature
            .iter()
            .find(|s| s.weather == count.weather);
        match spread {
            Some(s) => section.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
                count.weather,
                format_count(count.records as u64),
                s.min,
                s.q1,
                s.median,
                s.q3,
                s.max
            )),
            None => section.push_str(&format!(
                "| {} | {} | - | - | - | - | - |\n",
                count.weather,
                format_count(count.records as u64)
            )),
        }
    }
    section.push('\n');

    // Weather by season
    if !extras.season_weather_counts.is_empty() {
        section.push_str("### Weather Categories by Season\n\n");
        section.push_str("| Season | Weather | Records |\n");
        section.push_str("|:---|:---|---:|\n");
        for row in &extras.season_weather_counts {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                row.season,
                row.weather,
                format_count(row.records as u64)
            ));
        }
        section.push('\n');
    }

    // Temperature relationship
    let fmt_corr = |value: Option<f64>| {
        value
            .map(|v| format!("{:+.3}", v))
            .unwrap_or_else(|| "n/a".to_string())
    };
    let corr = &extras.temperature_correlation;
    section.push_str("### Rentals and Temperature\n\n");
    section.push_str("| | Total users | Casual | Registered |\n");
    section.push_str("|:---|---:|---:|---:|\n");
    section.push_str(&format!(
        "| Correlation with temperature | {} | {} | {} |\n\n",
        fmt_corr(corr.total_count),
        fmt_corr(corr.casual),
        fmt_corr(corr.registered)
    ));

    section
}

/// Per-season summary of daily temperature and daily rentals.
fn generate_season_temperature_table(seasonal_daily: &[SeasonalDay]) -> String {
    let mut table = String::new();
    if seasonal_daily.is_empty() {
        return table;
    }

    // (days, temp sum, rentals sum, min day, max day)
    let mut by_season: BTreeMap<Season, (usize, f64, u64, u64, u64)> = BTreeMap::new();
    for day in seasonal_daily {
        let total = day.counts.total_count;
        let entry = by_season
            .entry(day.season)
            .or_insert((0, 0.0, 0, u64::MAX, 0));
        entry.0 += 1;
        entry.1 += day.mean_temp;
        entry.2 = entry.2.saturating_add(total);
        entry.3 = entry.3.min(total);
        entry.4 = entry.4.max(total);
    }

    table.push_str("### Rentals by Season and Temperature\n\n");
    table.push_str("| Season | Days | Mean temp | Mean rentals/day | Quietest day | Busiest day |\n");
    table.push_str("|:---|---:|---:|---:|---:|---:|\n");
    for (season, (days, temp_sum, rentals, min, max)) in &by_season {
        table.push_str(&format!(
            "| {} {} | {} | {:.2} | {} | {} | {} |\n",
            season.emoji(),
            season,
            days,
            temp_sum / *days as f64,
            format_decimal(*rentals as f64 / *days as f64, 1),
            format_count(*min),
            format_count(*max)
        ));
    }
    table.push('\n');

    table
}

/// Render the narrative with `heading`, if the report has one.
fn narrative_block(report: &Report, heading: &str) -> String {
    report
        .narrative
        .iter()
        .find(|n| n.heading == heading)
        .map(generate_narrative)
        .unwrap_or_default()
}

fn generate_narrative(narrative: &Narrative) -> String {
    let mut block = String::new();

    block.push_str("**Analysis:**\n\n");
    for point in &narrative.points {
        block.push_str(&format!("- {}\n", point));
    }
    block.push('\n');

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by BikeDash*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::sample_dataset;
    use crate::report::build_report;

    fn create_test_report() -> Report {
        build_report(&sample_dataset(), &ReportConfig::default()).unwrap()
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.starts_with("# Bike Sharing Data Visualization"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Bike Users"));
        assert!(markdown.contains("## Monthly Bike Sharing Users"));
        assert!(markdown.contains("## Hourly Bike Sharing Users"));
        assert!(markdown.contains("## Extra Information"));
        assert!(markdown.contains("**Analysis:**"));
        assert!(!markdown.contains("### Daily Totals"));
    }

    #[test]
    fn test_monthly_section_is_calendar_ordered() {
        let report = create_test_report();
        let section = generate_monthly_section(&report.monthly, &report, 10);

        let jan = section.find("| Jan").unwrap();
        let feb = section.find("| Feb").unwrap();
        let dec = section.find("| Dec").unwrap();
        assert!(jan < feb && feb < dec);
        assert!(section.contains("Dec 🟢"));
        assert!(section.contains("Jan 🔴"));
    }

    #[test]
    fn test_totals_section() {
        let report = create_test_report();
        let section = generate_totals_section(&report.totals);

        assert!(section.contains(&format_count(report.totals.counts.total_count)));
        assert!(section.contains("Casual Bike Users"));
    }

    #[test]
    fn test_hourly_markers() {
        let report = create_test_report();
        let section =
            generate_hourly_section(&report.hourly, report.best_hour, report.worst_hour, 10);

        assert!(section.contains("**Best hour:** 23:00"));
        assert!(section.contains("⬇ worst"));
    }

    #[test]
    fn test_season_temperature_table() {
        let report = create_test_report();
        let table = generate_season_temperature_table(&report.seasonal_daily);

        assert!(table.contains("### Rentals by Season and Temperature"));
        for season in Season::ALL {
            assert!(table.contains(&format!("{} {} |", season.emoji(), season)));
        }
        // Winter: Jan, Feb and Dec on two days in two years
        assert!(table.contains("| ❄️ Winter | 12 |"));

        let markdown = generate_markdown_report(&report, &ReportConfig::default());
        assert!(markdown.contains("### Rentals by Season and Temperature"));
    }

    #[test]
    fn test_season_temperature_table_empty() {
        assert!(generate_season_temperature_table(&[]).is_empty());
    }

    #[test]
    fn test_optional_sections() {
        let config = ReportConfig {
            include_extras: false,
            include_narrative: false,
            include_daily: true,
            ..ReportConfig::default()
        };
        let report = build_report(&sample_dataset(), &config).unwrap();
        let markdown = generate_markdown_report(&report, &config);

        assert!(!markdown.contains("## Extra Information"));
        assert!(!markdown.contains("**Analysis:**"));
        assert!(markdown.contains("### Daily Totals"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"monthly\""));
        assert!(json.contains("\"best_hour\": 23"));
        assert!(json.contains("\"weekly\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["monthly"][0]["month"], "Jan");
    }
}
