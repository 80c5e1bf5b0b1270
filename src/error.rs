//! Error types for loading and querying the displacement dataset.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Facet;

/// The CSV header does not describe the dataset we expect.
///
/// Raised once at load time, after header normalization, so downstream
/// queries never have to guess at column names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Required columns absent after normalization.
    #[error("missing required column(s): {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// Two source headers normalize to the same canonical column.
    #[error("column '{column}' appears more than once in the header")]
    DuplicateColumn { column: String },

    /// A caller referred to a column name the schema does not know.
    #[error("unknown column '{name}'")]
    UnknownColumn { name: String },

    /// The column exists but cannot be used where it was requested.
    #[error("column '{name}' is not a demographic count")]
    NotAMeasure { name: String },
}

/// Fatal errors while reading the dataset. The dashboard must not render
/// anything when one of these is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV header is empty")]
    EmptyHeader,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A data cell could not be parsed. `row` is 1-based and excludes the header.
    #[error("row {row}: invalid value '{value}' for column '{column}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// A data row has a different number of fields than the header.
    #[error("row {row}: expected {expected} fields, found {found}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Invalid input to an aggregation. Recoverable: the caller shows a warning
/// and an empty result instead of failing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("no values selected for {0}")]
    EmptySelection(Facet),

    #[error("CAGR is undefined for a start value of {0} (must be positive)")]
    NonPositiveStart(f64),

    #[error("CAGR is undefined for an end value of {0} (must be positive)")]
    NonPositiveEnd(f64),

    #[error("CAGR is undefined over a span of zero years")]
    ZeroSpan,

    #[error("percentage pivot needs exactly two grouping dimensions, got {0}")]
    PivotArity(usize),

    #[error("year-over-year series must be grouped by year")]
    MissingYearDimension,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_every_missing_column() {
        let err = SchemaError::MissingColumns {
            columns: vec!["year".to_string(), "total".to_string()],
        };
        assert_eq!(err.to_string(), "missing required column(s): year, total");
    }

    #[test]
    fn schema_error_converts_into_load_error() {
        let err: LoadError = SchemaError::UnknownColumn {
            name: "foo".to_string(),
        }
        .into();
        assert!(matches!(err, LoadError::Schema(_)));
        assert_eq!(err.to_string(), "unknown column 'foo'");
    }

    #[test]
    fn row_length_error_reports_both_counts() {
        let err = LoadError::RowLength {
            row: 3,
            expected: 8,
            found: 6,
        };
        assert_eq!(err.to_string(), "row 3: expected 8 fields, found 6");
    }

    #[test]
    fn domain_error_names_the_facet() {
        let err = DomainError::EmptySelection(Facet::UrbanRural);
        assert_eq!(err.to_string(), "no values selected for urban/rural");
    }
}
