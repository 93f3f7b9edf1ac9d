//! Report assembly.
//!
//! Runs every aggregation once, in order, over the loaded dataset.

use crate::analysis;
use crate::config::ReportConfig;
use crate::data::Dataset;
use crate::error::{AnalysisResult, StructuralError};
use crate::models::{ExtraInsights, Report, ReportMetadata};
use crate::report::insights::narrate;
use chrono::Utc;
use tracing::{debug, info};

/// Build the complete report for `dataset`.
///
/// `duration_seconds` in the metadata is left at zero for the caller to fill.
pub fn build_report(dataset: &Dataset, config: &ReportConfig) -> AnalysisResult<Report> {
    let (first_date, last_date) = dataset.date_range().ok_or(StructuralError::EmptyInput {
        operation: "build_report",
    })?;

    info!("Aggregating {} records", dataset.len());

    let totals = analysis::overall_totals(dataset)?;
    let monthly = analysis::monthly_totals(dataset)?;
    let month_extremes = analysis::month_extremes(&monthly)?;
    let yearly_monthly = analysis::yearly_monthly_totals(dataset)?;
    let monthly_workingday = analysis::monthly_workingday_stats(dataset)?;
    let hourly = analysis::hourly_totals(dataset)?;
    let best_hour = analysis::best_hour(&hourly)?;
    let worst_hour = analysis::worst_hour(&hourly)?;
    let season_year = analysis::season_year_totals(dataset)?;
    let seasonal_daily = analysis::seasonal_daily(dataset)?;
    let daily = analysis::daily_totals(dataset)?;
    let weekly = analysis::weekly_trend(&daily)?;

    debug!(
        "Tables: {} months, {} year-months, {} hours, {} days, {} weeks",
        monthly.len(),
        yearly_monthly.len(),
        hourly.len(),
        daily.len(),
        weekly.len()
    );

    let extras = if config.include_extras {
        Some(build_extras(dataset, config.histogram_bins)?)
    } else {
        None
    };

    let mut report = Report {
        metadata: ReportMetadata {
            title: config.title.clone(),
            source: dataset.source().display().to_string(),
            generated_at: Utc::now(),
            records: dataset.len(),
            first_date,
            last_date,
            duration_seconds: 0.0,
        },
        totals,
        monthly,
        month_extremes,
        yearly_monthly,
        monthly_workingday,
        hourly,
        best_hour,
        worst_hour,
        season_year,
        seasonal_daily,
        daily,
        weekly,
        extras,
        narrative: Vec::new(),
    };

    if config.include_narrative {
        report.narrative = narrate(&report);
    }

    Ok(report)
}

fn build_extras(dataset: &Dataset, bins: usize) -> AnalysisResult<ExtraInsights> {
    Ok(ExtraInsights {
        temperature_histogram: analysis::temperature_histogram(dataset, bins)?,
        season_means: analysis::season_means(dataset)?,
        weather_counts: analysis::weather_counts(dataset)?,
        weather_temperature: analysis::weather_temperature_spread(dataset)?,
        season_weather_counts: analysis::season_weather_counts(dataset)?,
        temperature_correlation: analysis::temperature_correlation(dataset)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::sample_dataset;

    #[test]
    fn test_build_report() {
        let dataset = sample_dataset();

        let report = build_report(&dataset, &ReportConfig::default()).unwrap();

        assert_eq!(report.metadata.records, dataset.len());
        assert_eq!(report.monthly.len(), 12);
        assert_eq!(report.yearly_monthly.len(), 24);
        assert_eq!(report.hourly.len(), 4);
        assert_eq!(report.best_hour, 23);
        assert_eq!(report.worst_hour, 0);
        assert!(report.extras.is_some());
        assert!(!report.narrative.is_empty());
        assert_eq!(report.metadata.first_date.to_string(), "2011-01-01");
        assert_eq!(report.metadata.last_date.to_string(), "2012-12-15");
    }

    #[test]
    fn test_sections_can_be_disabled() {
        let dataset = sample_dataset();
        let config = ReportConfig {
            include_extras: false,
            include_narrative: false,
            ..ReportConfig::default()
        };

        let report = build_report(&dataset, &config).unwrap();

        assert!(report.extras.is_none());
        assert!(report.narrative.is_empty());
    }

    #[test]
    fn test_build_report_from_fixture() {
        let path = std::path::Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/fixtures/hour_sample.csv"
        ));
        let dataset = crate::data::load_dataset(path, &Default::default()).unwrap();

        let report = build_report(&dataset, &ReportConfig::default()).unwrap();

        assert_eq!(report.metadata.records, 40);
        assert_eq!(report.monthly.len(), 1);
        assert_eq!(report.daily.len(), 10);
        // Sat+Sun, a full week, then a lone Monday
        let days: Vec<usize> = report.weekly.iter().map(|w| w.days).collect();
        assert_eq!(days, vec![2, 7, 1]);
        assert_eq!(report.weekly[0].week_ending.to_string(), "2011-01-02");
        assert_eq!(report.best_hour, 18);
        assert_eq!(report.worst_hour, 0);
        assert_eq!(
            report.totals.counts.casual + report.totals.counts.registered,
            report.totals.counts.total_count
        );
    }

    #[test]
    fn test_empty_dataset_is_refused() {
        let dataset = Dataset::from_records(Vec::new());
        assert!(build_report(&dataset, &ReportConfig::default()).is_err());
    }
}
