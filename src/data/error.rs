use thiserror::Error;

use super::model::CellValue;

/// Failures that make a source file unusable as a track table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: missing value in column '{column}'")]
    MissingValue { row: usize, column: String },

    #[error("row {row}: '{value}' in column '{column}' is not a number")]
    MalformedNumber {
        row: usize,
        column: String,
        value: String,
    },
}

/// Non-fatal problems found in otherwise usable data.
///
/// These never abort a computation; they are collected so the caller can
/// warn the user that a result was computed from partial input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataIssue {
    #[error("row {row}: year value '{raw}' is not an integer")]
    MalformedYearValue { row: usize, raw: CellValue },

    #[error("column '{0}' is not present")]
    MissingColumn(String),
}
