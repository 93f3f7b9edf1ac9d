//! CSV loading for the usage dataset.
//!
//! The file must have a header row naming every column in
//! [`REQUIRED_COLUMNS`]; other columns are ignored and column order is free.
//! Fields may be double-quoted, in which case they may contain the delimiter
//! and `""` stands for a literal quote. Quoted fields spanning several lines
//! are not supported.

use crate::data::Dataset;
use crate::error::{DatasetError, LoadError, StructuralError};
use crate::models::{Counts, Month, Season, UsageRecord};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Columns the aggregation pipeline reads.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "date",
    "year",
    "month",
    "hour",
    "season",
    "weather",
    "workingday",
    "temp",
    "casual",
    "registered",
    "total_count",
];

/// Options for loading a dataset.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether to show a progress bar while parsing.
    pub show_progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            show_progress: false,
        }
    }
}

/// Load the dataset at `path`.
///
/// A missing or unreadable file is a [`LoadError`]; malformed content is a
/// [`StructuralError`].
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset, DatasetError> {
    info!("Loading dataset: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let records = parse_records(&content, options)?;
    info!("Loaded {} usage records", records.len());

    Ok(Dataset::new(path, records))
}

/// Parse CSV text into usage records.
pub fn parse_records(
    content: &str,
    options: &LoadOptions,
) -> Result<Vec<UsageRecord>, StructuralError> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or(StructuralError::EmptyInput {
        operation: "load_dataset",
    })?;
    let header = split_fields(header_line.trim_start_matches('\u{feff}'), options.delimiter);
    let columns = ColumnIndex::from_header(&header)?;
    debug!("Header has {} columns", header.len());

    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new(content.lines().count().saturating_sub(1) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut records = Vec::new();
    for (line_number, line) in lines {
        let fields = split_fields(line, options.delimiter);
        if fields.len() != header.len() {
            return Err(StructuralError::FieldCount {
                line: line_number,
                expected: header.len(),
                found: fields.len(),
            });
        }

        records.push(columns.parse_record(&fields, line_number)?);

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    if records.is_empty() {
        return Err(StructuralError::EmptyInput {
            operation: "load_dataset",
        });
    }

    Ok(records)
}

/// Split one CSV line into fields, honouring double quotes.
fn split_fields(line: &str, delimiter: u8) -> Vec<String> {
    let delim = delimiter as char;
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delim && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Position of each required column in the header.
struct ColumnIndex {
    date: usize,
    year: usize,
    month: usize,
    hour: usize,
    season: usize,
    weather: usize,
    workingday: usize,
    temp: usize,
    casual: usize,
    registered: usize,
    total_count: usize,
}

impl ColumnIndex {
    fn from_header(header: &[String]) -> Result<Self, StructuralError> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| !header.iter().any(|h| h.eq_ignore_ascii_case(name)))
            .collect();
        if let Some(first) = missing.first() {
            debug!("Missing columns: {}", missing.join(", "));
            return Err(StructuralError::MissingColumn {
                column: first.to_string(),
            });
        }

        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| StructuralError::MissingColumn {
                    column: name.to_string(),
                })
        };

        Ok(Self {
            date: find("date")?,
            year: find("year")?,
            month: find("month")?,
            hour: find("hour")?,
            season: find("season")?,
            weather: find("weather")?,
            workingday: find("workingday")?,
            temp: find("temp")?,
            casual: find("casual")?,
            registered: find("registered")?,
            total_count: find("total_count")?,
        })
    }

    fn parse_record(&self, fields: &[String], line: usize) -> Result<UsageRecord, StructuralError> {
        let field = |index: usize, column: &'static str| FieldRef {
            line,
            column,
            value: fields[index].as_str(),
        };

        let hour = field(self.hour, "hour").parse::<u8>()?;
        if hour > 23 {
            return Err(field(self.hour, "hour").invalid("hour must be between 0 and 23"));
        }

        let temp = field(self.temp, "temp").parse::<f64>()?;
        if !temp.is_finite() {
            return Err(field(self.temp, "temp").invalid("temperature must be a finite number"));
        }

        let weather = fields[self.weather].clone();
        if weather.is_empty() {
            return Err(field(self.weather, "weather").invalid("weather label is empty"));
        }

        let record = UsageRecord {
            date: parse_date(field(self.date, "date"))?,
            year: field(self.year, "year").parse::<i32>()?,
            month: field(self.month, "month").parse::<Month>()?,
            hour,
            season: field(self.season, "season").parse::<Season>()?,
            weather,
            workingday: parse_flag(field(self.workingday, "workingday"))?,
            temp,
            casual: field(self.casual, "casual").parse::<u64>()?,
            registered: field(self.registered, "registered").parse::<u64>()?,
            total_count: field(self.total_count, "total_count").parse::<u64>()?,
        };

        let counts = Counts {
            casual: record.casual,
            registered: record.registered,
            total_count: record.total_count,
        };
        if !counts.is_consistent() {
            return Err(StructuralError::InconsistentCounts {
                line,
                casual: record.casual,
                registered: record.registered,
                total: record.total_count,
            });
        }

        Ok(record)
    }
}

/// A raw field together with where it came from, for error reporting.
struct FieldRef<'a> {
    line: usize,
    column: &'a str,
    value: &'a str,
}

impl FieldRef<'_> {
    fn invalid(&self, reason: impl Into<String>) -> StructuralError {
        StructuralError::InvalidValue {
            line: self.line,
            column: self.column.to_string(),
            value: self.value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse<T>(&self) -> Result<T, StructuralError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.value.parse::<T>().map_err(|e| self.invalid(e.to_string()))
    }
}

/// Dates are `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by a time.
fn parse_date(field: FieldRef<'_>) -> Result<NaiveDate, StructuralError> {
    let date_part = field
        .value
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(field.value);

    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .ok_or_else(|| field.invalid("expected a date like 2011-01-31"))
}

fn parse_flag(field: FieldRef<'_>) -> Result<bool, StructuralError> {
    match field.value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(field.invalid("expected 1/0, true/false or yes/no")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "date,season,year,month,hour,workingday,weather,temp,casual,registered,total_count";

    fn csv(rows: &[&str]) -> String {
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content
    }

    #[test]
    fn test_parse_records() {
        let content = csv(&[
            "2011-01-01,Spring,2011,Jan,0,0,Clear,9.84,3,13,16",
            "2011-01-01,Spring,2011,Jan,1,0,Clear,9.02,8,32,40",
        ]);

        let records = parse_records(&content, &LoadOptions::default()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].month, Month::Jan);
        assert_eq!(records[0].season, Season::Spring);
        assert!(!records[0].workingday);
        assert_eq!(records[1].hour, 1);
        assert_eq!(records[1].total_count, 40);
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let content = "instant,total_count,registered,casual,temp,weather,workingday,hour,month,year,season,date,hum\n\
                       1,16,13,3,9.84,Clear,1,0,Feb,2011,Spring,2011-02-01,0.81";

        let records = parse_records(content, &LoadOptions::default()).unwrap();

        assert_eq!(records[0].month, Month::Feb);
        assert!(records[0].workingday);
        assert_eq!(records[0].casual, 3);
    }

    #[test]
    fn test_quoted_fields() {
        let content = csv(&["2011-01-01,Spring,2011,Jan,0,0,\"Mist, Cloudy\",9.84,3,13,16"]);

        let records = parse_records(&content, &LoadOptions::default()).unwrap();

        assert_eq!(records[0].weather, "Mist, Cloudy");
    }

    #[test]
    fn test_split_fields_escaped_quote() {
        let fields = split_fields("a,\"say \"\"hi\"\"\",c", b',');
        assert_eq!(fields, vec!["a", "say \"hi\"", "c"]);
    }

    #[test]
    fn test_missing_column() {
        let content = "date,year,month,hour,season,weather,workingday,temp,casual,registered\n\
                       2011-01-01,2011,Jan,0,Spring,Clear,0,9.84,3,13";

        let err = parse_records(content, &LoadOptions::default()).unwrap_err();

        assert_eq!(
            err,
            StructuralError::MissingColumn {
                column: "total_count".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_hour() {
        let content = csv(&["2011-01-01,Spring,2011,Jan,24,0,Clear,9.84,3,13,16"]);

        let err = parse_records(&content, &LoadOptions::default()).unwrap_err();

        match err {
            StructuralError::InvalidValue { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "hour");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_month() {
        let content = csv(&["2011-01-01,Spring,2011,Janvier,0,0,Clear,9.84,3,13,16"]);

        let err = parse_records(&content, &LoadOptions::default()).unwrap_err();

        assert!(matches!(err, StructuralError::InvalidValue { ref column, .. } if column == "month"));
    }

    #[test]
    fn test_inconsistent_counts() {
        let content = csv(&["2011-01-01,Spring,2011,Jan,0,0,Clear,9.84,3,13,17"]);

        let err = parse_records(&content, &LoadOptions::default()).unwrap_err();

        assert!(matches!(err, StructuralError::InconsistentCounts { line: 2, .. }));
    }

    #[test]
    fn test_field_count_mismatch() {
        let content = csv(&["2011-01-01,Spring,2011,Jan,0,0,Clear,9.84,3,13"]);

        let err = parse_records(&content, &LoadOptions::default()).unwrap_err();

        assert!(matches!(
            err,
            StructuralError::FieldCount {
                expected: 11,
                found: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_header_only_is_empty() {
        let err = parse_records(HEADER, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, StructuralError::EmptyInput { .. }));
    }

    #[test]
    fn test_alternate_value_forms() {
        let content = csv(&["2011/07/04 00:00:00,3,2011,7,17,yes,Clear,30.5,100,200,300"]);

        let records = parse_records(&content, &LoadOptions::default()).unwrap();

        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2011, 7, 4).unwrap());
        assert_eq!(records[0].season, Season::Fall);
        assert_eq!(records[0].month, Month::Jul);
        assert!(records[0].workingday);
    }

    #[test]
    fn test_load_missing_file_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.csv");

        let err = load_dataset(&path, &LoadOptions::default()).unwrap_err();

        assert!(err.is_load_failure());
        assert!(matches!(err, DatasetError::Load(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "\u{feff}{}\r\n2011-01-01,Spring,2011,Jan,0,0,Clear,9.84,3,13,16\r\n\r\n",
            HEADER
        )
        .unwrap();

        let dataset = load_dataset(file.path(), &LoadOptions::default()).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.source(), file.path());
    }

    #[test]
    fn test_load_malformed_file_is_structural() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "date,year\n2011-01-01,2011\n").unwrap();

        let err = load_dataset(file.path(), &LoadOptions::default()).unwrap_err();

        assert!(!err.is_load_failure());
    }
}
