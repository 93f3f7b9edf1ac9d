//! Distribution and relationship breakdowns.
//!
//! Temperature distribution, per-season means, weather category counts and
//! spread, and how rentals move with temperature.

use crate::analysis::aggregator::require_records;
use crate::data::Dataset;
use crate::error::{AnalysisResult, StructuralError};
use crate::models::{
    HistogramBin, Season, SeasonMean, SeasonWeatherCount, TemperatureCorrelation, WeatherCount,
    WeatherTemperature,
};
use std::collections::{BTreeMap, HashMap};

/// Equal-width histogram of `temp` between its minimum and maximum.
///
/// The last bin is closed on the right so the maximum is counted. When every
/// temperature is equal a single bin holds all records.
pub fn temperature_histogram(dataset: &Dataset, bins: usize) -> AnalysisResult<Vec<HistogramBin>> {
    let records = require_records(dataset, "temperature_histogram")?;
    if bins == 0 {
        return Err(StructuralError::InvalidArgument {
            operation: "temperature_histogram",
            message: "bin count must be at least 1".to_string(),
        });
    }

    let min = records.iter().map(|r| r.temp).fold(f64::INFINITY, f64::min);
    let max = records.iter().map(|r| r.temp).fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: records.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for record in records {
        let index = ((record.temp - min) / width).floor() as usize;
        counts[index.min(bins - 1)] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i == bins - 1 {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect())
}

/// Mean per-record `total_count` for each season present.
pub fn season_means(dataset: &Dataset) -> AnalysisResult<Vec<SeasonMean>> {
    let records = require_records(dataset, "season_means")?;

    let mut grouped: BTreeMap<Season, (usize, u64)> = BTreeMap::new();
    for record in records {
        let entry = grouped.entry(record.season).or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(record.total_count);
    }

    Ok(grouped
        .into_iter()
        .map(|(season, (n, sum))| SeasonMean {
            season,
            records: n,
            mean_total: sum as f64 / n as f64,
        })
        .collect())
}

/// Number of records per weather label, in order of first appearance.
pub fn weather_counts(dataset: &Dataset) -> AnalysisResult<Vec<WeatherCount>> {
    let records = require_records(dataset, "weather_counts")?;

    let mut counts: Vec<WeatherCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records {
        match index.get(record.weather.as_str()) {
            Some(&i) => counts[i].records += 1,
            None => {
                index.insert(record.weather.as_str(), counts.len());
                counts.push(WeatherCount {
                    weather: record.weather.clone(),
                    records: 1,
                });
            }
        }
    }

    Ok(counts)
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// Five-number temperature summary per weather label.
pub fn weather_temperature_spread(dataset: &Dataset) -> AnalysisResult<Vec<WeatherTemperature>> {
    let records = require_records(dataset, "weather_temperature_spread")?;

    let mut order: Vec<&str> = Vec::new();
    let mut temps: HashMap<&str, Vec<f64>> = HashMap::new();
    for record in records {
        temps
            .entry(record.weather.as_str())
            .or_insert_with(|| {
                order.push(record.weather.as_str());
                Vec::new()
            })
            .push(record.temp);
    }

    Ok(order
        .into_iter()
        .filter_map(|weather| {
            let mut values = temps.remove(weather)?;
            values.sort_by(f64::total_cmp);
            Some(WeatherTemperature {
                weather: weather.to_string(),
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
            })
        })
        .collect())
}

/// Number of records per (season, weather); weather labels keep their
/// first-appearance order within a season.
pub fn season_weather_counts(dataset: &Dataset) -> AnalysisResult<Vec<SeasonWeatherCount>> {
    let records = require_records(dataset, "season_weather_counts")?;

    let mut by_season: BTreeMap<Season, Vec<SeasonWeatherCount>> = BTreeMap::new();
    for record in records {
        let rows = by_season.entry(record.season).or_default();
        match rows.iter_mut().find(|row| row.weather == record.weather) {
            Some(row) => row.records += 1,
            None => rows.push(SeasonWeatherCount {
                season: record.season,
                weather: record.weather.clone(),
                records: 1,
            }),
        }
    }

    Ok(by_season.into_values().flatten().collect())
}

/// Pearson correlation coefficient, `None` when either side is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// How each count column moves with temperature.
pub fn temperature_correlation(dataset: &Dataset) -> AnalysisResult<TemperatureCorrelation> {
    let records = require_records(dataset, "temperature_correlation")?;

    let temps: Vec<f64> = records.iter().map(|r| r.temp).collect();
    let column = |value: fn(&crate::models::UsageRecord) -> u64| -> Vec<f64> {
        records.iter().map(|r| value(r) as f64).collect()
    };

    Ok(TemperatureCorrelation {
        total_count: pearson(&temps, &column(|r| r.total_count)),
        casual: pearson(&temps, &column(|r| r.casual)),
        registered: pearson(&temps, &column(|r| r.registered)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{dataset_of, record, sample_dataset};

    fn with_temp(temp: f64, weather: &str) -> crate::models::UsageRecord {
        let mut r = record("2011-05-02", 12, 10);
        r.temp = temp;
        r.weather = weather.to_string();
        r
    }

    #[test]
    fn test_histogram_counts_every_record() {
        let dataset = sample_dataset();

        let bins = temperature_histogram(&dataset, 20).unwrap();

        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), dataset.len());
        assert!(bins[0].lower <= bins[0].upper);
        for pair in bins.windows(2) {
            assert!((pair[0].upper - pair[1].lower).abs() < 1e-9);
        }
    }

    #[test]
    fn test_histogram_edges() {
        let dataset = dataset_of(vec![
            with_temp(0.0, "Clear"),
            with_temp(5.0, "Clear"),
            with_temp(10.0, "Clear"),
        ]);

        let bins = temperature_histogram(&dataset, 2).unwrap();

        assert_eq!(bins[0].count, 1);
        // 5.0 sits on the boundary and belongs to the upper bin, as does the max
        assert_eq!(bins[1].count, 2);
        assert_eq!(bins[1].upper, 10.0);
    }

    #[test]
    fn test_histogram_constant_and_invalid() {
        let dataset = dataset_of(vec![with_temp(3.0, "Clear"), with_temp(3.0, "Mist")]);

        let bins = temperature_histogram(&dataset, 10).unwrap();
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);

        assert!(matches!(
            temperature_histogram(&dataset, 0),
            Err(StructuralError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_season_means() {
        let dataset = sample_dataset();

        let means = season_means(&dataset).unwrap();

        let seasons: Vec<Season> = means.iter().map(|m| m.season).collect();
        assert_eq!(seasons, Season::ALL.to_vec());
        assert!(means.iter().all(|m| m.mean_total > 0.0));
        assert_eq!(means.iter().map(|m| m.records).sum::<usize>(), dataset.len());
    }

    #[test]
    fn test_weather_counts_first_appearance_order() {
        let dataset = dataset_of(vec![
            with_temp(1.0, "Mist"),
            with_temp(2.0, "Clear"),
            with_temp(3.0, "Mist"),
        ]);

        let counts = weather_counts(&dataset).unwrap();

        assert_eq!(counts[0].weather, "Mist");
        assert_eq!(counts[0].records, 2);
        assert_eq!(counts[1].weather, "Clear");
        assert_eq!(counts[1].records, 1);
    }

    #[test]
    fn test_weather_temperature_spread() {
        let dataset = dataset_of(vec![
            with_temp(4.0, "Clear"),
            with_temp(1.0, "Clear"),
            with_temp(3.0, "Clear"),
            with_temp(2.0, "Clear"),
            with_temp(9.0, "Rain"),
        ]);

        let spread = weather_temperature_spread(&dataset).unwrap();

        assert_eq!(spread.len(), 2);
        let clear = &spread[0];
        assert_eq!(clear.min, 1.0);
        assert_eq!(clear.q1, 1.75);
        assert_eq!(clear.median, 2.5);
        assert_eq!(clear.q3, 3.25);
        assert_eq!(clear.max, 4.0);
        assert_eq!(spread[1].median, 9.0);
    }

    #[test]
    fn test_season_weather_counts() {
        let dataset = sample_dataset();

        let rows = season_weather_counts(&dataset).unwrap();

        assert_eq!(rows.iter().map(|r| r.records).sum::<usize>(), dataset.len());
        assert_eq!(rows[0].season, Season::Spring);
        assert!(rows.windows(2).all(|w| w[0].season <= w[1].season));
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &[8.0, 6.0, 4.0, 2.0]).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&xs, &[5.0, 5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn test_temperature_correlation_positive_on_sample() {
        let dataset = sample_dataset();

        let correlation = temperature_correlation(&dataset).unwrap();

        // Both temperature and rentals grow with the month in the sample
        assert!(correlation.total_count.unwrap() > 0.0);
    }
}
