//! Usage aggregation.
//!
//! Every function here borrows the dataset, makes a single pass over its
//! records and returns a new table ordered by its grouping key. Keys order
//! naturally: months by calendar rank, seasons Spring→Winter, working day
//! `false` before `true`. Empty input is refused with
//! [`StructuralError::EmptyInput`] instead of producing an empty table.

use crate::data::Dataset;
use crate::error::{AnalysisResult, StructuralError};
use crate::models::{
    Counts, DailyTotal, HourlyTotal, Month, MonthExtremes, MonthWorkingdayStats, MonthlyTotal,
    OverallTotals, Season, SeasonYearTotal, SeasonalDay, UsageRecord, YearMonthTotal,
};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Borrow the records, refusing an empty dataset.
pub(crate) fn require_records<'a>(
    dataset: &'a Dataset,
    operation: &'static str,
) -> AnalysisResult<&'a [UsageRecord]> {
    if dataset.is_empty() {
        return Err(StructuralError::EmptyInput { operation });
    }
    Ok(dataset.records())
}

/// Sum counts per key, ordered by key.
fn sum_by<K: Ord>(records: &[UsageRecord], key: impl Fn(&UsageRecord) -> K) -> BTreeMap<K, Counts> {
    let mut grouped: BTreeMap<K, Counts> = BTreeMap::new();

    for record in records {
        grouped.entry(key(record)).or_default().add(record);
    }

    grouped
}

/// Grand totals of the whole dataset.
pub fn overall_totals(dataset: &Dataset) -> AnalysisResult<OverallTotals> {
    let records = require_records(dataset, "overall_totals")?;

    let mut counts = Counts::default();
    for record in records {
        counts.add(record);
    }

    Ok(OverallTotals {
        records: records.len(),
        counts,
    })
}

/// Rentals per month, Jan→Dec. Months without records are absent.
pub fn monthly_totals(dataset: &Dataset) -> AnalysisResult<Vec<MonthlyTotal>> {
    let records = require_records(dataset, "monthly_totals")?;

    let totals: Vec<MonthlyTotal> = sum_by(records, |r| r.month)
        .into_iter()
        .map(|(month, counts)| MonthlyTotal { month, counts })
        .collect();

    debug!("Monthly totals: {} months", totals.len());
    Ok(totals)
}

/// Rentals per (year, month), year ascending then calendar month.
pub fn yearly_monthly_totals(dataset: &Dataset) -> AnalysisResult<Vec<YearMonthTotal>> {
    let records = require_records(dataset, "yearly_monthly_totals")?;

    Ok(sum_by(records, |r| (r.year, r.month))
        .into_iter()
        .map(|((year, month), counts)| YearMonthTotal {
            year,
            month,
            counts,
        })
        .collect())
}

/// Mean and sum of `total_count` per (month, working day).
pub fn monthly_workingday_stats(dataset: &Dataset) -> AnalysisResult<Vec<MonthWorkingdayStats>> {
    let records = require_records(dataset, "monthly_workingday_stats")?;

    let mut grouped: BTreeMap<(Month, bool), (usize, u64)> = BTreeMap::new();
    for record in records {
        let entry = grouped
            .entry((record.month, record.workingday))
            .or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(record.total_count);
    }

    Ok(grouped
        .into_iter()
        .map(|((month, workingday), (count, sum))| MonthWorkingdayStats {
            month,
            workingday,
            records: count,
            mean_total: sum as f64 / count as f64,
            sum_total: sum,
        })
        .collect())
}

/// Rentals per hour of day, ascending.
pub fn hourly_totals(dataset: &Dataset) -> AnalysisResult<Vec<HourlyTotal>> {
    let records = require_records(dataset, "hourly_totals")?;

    Ok(sum_by(records, |r| r.hour)
        .into_iter()
        .map(|(hour, counts)| HourlyTotal { hour, counts })
        .collect())
}

/// Hour whose total is extremal in the `wanted` direction; ties go to the
/// smallest hour.
fn select_hour(
    hourly: &[HourlyTotal],
    wanted: Ordering,
    operation: &'static str,
) -> AnalysisResult<u8> {
    let mut selected: Option<&HourlyTotal> = None;

    for row in hourly {
        selected = match selected {
            None => Some(row),
            Some(current) => {
                let by_total = row.counts.total_count.cmp(&current.counts.total_count);
                if by_total == wanted || (by_total == Ordering::Equal && row.hour < current.hour) {
                    Some(row)
                } else {
                    Some(current)
                }
            }
        };
    }

    selected
        .map(|row| row.hour)
        .ok_or(StructuralError::EmptyInput { operation })
}

/// Hour with the most rentals.
pub fn best_hour(hourly: &[HourlyTotal]) -> AnalysisResult<u8> {
    select_hour(hourly, Ordering::Greater, "best_hour")
}

/// Hour with the fewest rentals.
pub fn worst_hour(hourly: &[HourlyTotal]) -> AnalysisResult<u8> {
    select_hour(hourly, Ordering::Less, "worst_hour")
}

/// Highest and lowest month of a monthly table; ties go to the earlier month.
pub fn month_extremes(monthly: &[MonthlyTotal]) -> AnalysisResult<MonthExtremes> {
    let earliest_of = |wanted: Ordering| {
        monthly.iter().reduce(|current, row| {
            match row.counts.total_count.cmp(&current.counts.total_count) {
                ord if ord == wanted => row,
                Ordering::Equal if row.month < current.month => row,
                _ => current,
            }
        })
    };

    match (earliest_of(Ordering::Greater), earliest_of(Ordering::Less)) {
        (Some(highest), Some(lowest)) => Ok(MonthExtremes {
            highest: highest.clone(),
            lowest: lowest.clone(),
        }),
        _ => Err(StructuralError::EmptyInput {
            operation: "month_extremes",
        }),
    }
}

/// Rentals per (season, year).
pub fn season_year_totals(dataset: &Dataset) -> AnalysisResult<Vec<SeasonYearTotal>> {
    let records = require_records(dataset, "season_year_totals")?;

    Ok(sum_by(records, |r| (r.season, r.year))
        .into_iter()
        .map(|((season, year), counts)| SeasonYearTotal {
            season,
            year,
            counts,
        })
        .collect())
}

/// Mean temperature and summed rentals per (date, season).
pub fn seasonal_daily(dataset: &Dataset) -> AnalysisResult<Vec<SeasonalDay>> {
    let records = require_records(dataset, "seasonal_daily")?;

    let mut grouped: BTreeMap<(NaiveDate, Season), (Counts, f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = grouped.entry((record.date, record.season)).or_default();
        entry.0.add(record);
        entry.1 += record.temp;
        entry.2 += 1;
    }

    Ok(grouped
        .into_iter()
        .map(|((date, season), (counts, temp_sum, n))| SeasonalDay {
            date,
            season,
            mean_temp: temp_sum / n as f64,
            counts,
        })
        .collect())
}

/// Rentals per calendar date, ascending.
pub fn daily_totals(dataset: &Dataset) -> AnalysisResult<Vec<DailyTotal>> {
    let records = require_records(dataset, "daily_totals")?;

    Ok(sum_by(records, |r| r.date)
        .into_iter()
        .map(|(date, counts)| DailyTotal { date, counts })
        .collect())
}
