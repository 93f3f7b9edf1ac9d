//! Aggregation pipeline.
//!
//! Pure functions from the loaded [`crate::data::Dataset`] to ordered
//! summary tables.

pub mod aggregator;
pub mod extras;
pub mod trend;

pub use aggregator::*;
pub use extras::*;
pub use trend::*;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::data::Dataset;
    use crate::models::{Month, Season, UsageRecord};
    use chrono::{Datelike, NaiveDate};

    /// A working-day record on `date` (YYYY-MM-DD) with a 1:3 casual split.
    pub fn record(date: &str, hour: u8, total: u64) -> UsageRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        let casual = total / 4;

        UsageRecord {
            date,
            year: date.year(),
            month: Month::ALL[date.month0() as usize],
            hour,
            season: Season::Spring,
            weather: "Clear".to_string(),
            workingday: true,
            temp: 20.0,
            casual,
            registered: total - casual,
            total_count: total,
        }
    }

    pub fn dataset_of(records: Vec<UsageRecord>) -> Dataset {
        Dataset::from_records(records)
    }

    /// Two years of synthetic records covering every month and season.
    pub fn sample_dataset() -> Dataset {
        let weathers = ["Clear", "Mist", "Light Rain"];
        let mut records = Vec::new();

        for year in [2011, 2012] {
            for month in 1..=12u32 {
                for day in [1u32, 15] {
                    for (slot, hour) in [0u8, 8, 17, 23].into_iter().enumerate() {
                        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
                        let total = (month as u64) * 7
                            + (hour as u64) * 3
                            + day as u64
                            + (year as u64 - 2010) * 50;
                        let casual = total / 3;

                        records.push(UsageRecord {
                            date,
                            year,
                            month: Month::ALL[(month - 1) as usize],
                            hour,
                            season: match month {
                                3..=5 => Season::Spring,
                                6..=8 => Season::Summer,
                                9..=11 => Season::Fall,
                                _ => Season::Winter,
                            },
                            weather: weathers[slot % weathers.len()].to_string(),
                            workingday: day == 15,
                            temp: 5.0 + month as f64 * 2.0 + hour as f64 * 0.25,
                            casual,
                            registered: total - casual,
                            total_count: total,
                        });
                    }
                }
            }
        }

        Dataset::from_records(records)
    }
}
