//! Error types for loading and aggregating the usage dataset.
//!
//! Two kinds of failure exist: a *load* failure (the data file is missing or
//! unreadable, so there is no data to show) and a *structural* failure (the
//! data does not have the shape an aggregation requires).

use std::path::PathBuf;

/// The data file could not be read at all.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No file exists at the given path
    #[error("Data file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The file exists but reading it failed
    #[error("Failed to read data file {}: {source}", path.display())]
    Unreadable {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// The dataset does not satisfy the contract of an operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    /// A required column is absent from the header row
    #[error("Required column '{column}' is missing from the header")]
    MissingColumn {
        /// Name of the missing column
        column: String,
    },

    /// A field could not be parsed into its column type
    #[error("Line {line}: invalid value '{value}' in column '{column}': {reason}")]
    InvalidValue {
        /// 1-indexed line number in the source file
        line: usize,
        /// Column name
        column: String,
        /// Raw field text
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A row has a different number of fields than the header
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        /// 1-indexed line number in the source file
        line: usize,
        /// Number of header columns
        expected: usize,
        /// Number of fields on the line
        found: usize,
    },

    /// casual + registered does not equal total_count
    #[error("Line {line}: casual ({casual}) + registered ({registered}) != total_count ({total})")]
    InconsistentCounts {
        /// 1-indexed line number in the source file
        line: usize,
        /// Casual count
        casual: u64,
        /// Registered count
        registered: u64,
        /// Total count
        total: u64,
    },

    /// An operation received no rows
    #[error("{operation}: input is empty")]
    EmptyInput {
        /// Name of the operation that refused the input
        operation: &'static str,
    },

    /// An argument is outside the range an operation accepts
    #[error("{operation}: {message}")]
    InvalidArgument {
        /// Name of the operation
        operation: &'static str,
        /// Description of the problem
        message: String,
    },
}

/// Any failure while producing a [`crate::data::Dataset`].
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// No data is available
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Data is available but malformed
    #[error(transparent)]
    Structural(#[from] StructuralError),
}

impl DatasetError {
    /// Returns true when the failure means "there is no data to show".
    pub fn is_load_failure(&self) -> bool {
        matches!(self, DatasetError::Load(_))
    }
}

/// Result alias for aggregation operations.
pub type AnalysisResult<T> = Result<T, StructuralError>;
