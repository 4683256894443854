//! Error types for tabcompare operations

use crate::reader::Side;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompareError>;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Delimited data error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Error while {operation}{}: {message}", column_suffix(.column))]
    Source {
        operation: String,
        column: Option<String>,
        message: String,
    },

    #[error("{side} data{}: {source}", row_suffix(.row))]
    AtSide {
        side: Side,
        row: Option<u64>,
        #[source]
        source: Box<CompareError>,
    },

    #[error("Invalid parameter '{parameter}': {message}")]
    Config { parameter: String, message: String },

    #[error("Unsupported format '{format}' in parameter '{parameter}'. Acceptable ones are: {acceptable}")]
    UnsupportedFormat {
        parameter: String,
        format: String,
        acceptable: String,
    },

    #[error("Error occurred while executing {side} script. Exit code: {exit_code}\nOutput: {stdout}\nError text: {stderr}")]
    Script {
        side: Side,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Numeric value '{value}' in column '{column}' could not be parsed")]
    NumericParse { column: String, value: String },

    #[error("Comparison has been interrupted after {rows} rows")]
    Interrupted { rows: u64 },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

fn column_suffix(column: &Option<String>) -> String {
    column
        .as_ref()
        .map(|c| format!(" for column '{}'", c))
        .unwrap_or_default()
}

fn row_suffix(row: &Option<u64>) -> String {
    row.map(|r| format!(" at row #{}", r)).unwrap_or_default()
}

impl CompareError {
    pub fn source_failure(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            operation: operation.into(),
            column: None,
            message: message.into(),
        }
    }

    pub fn column_failure(
        operation: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Source {
            operation: operation.into(),
            column: Some(column.into()),
            message: message.into(),
        }
    }

    pub fn config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Attach the side and row position an error occurred on.
    ///
    /// Errors that already carry a side are returned untouched so the
    /// innermost (most precise) location wins.
    pub fn at_side(self, side: Side, row: Option<u64>) -> Self {
        match self {
            Self::AtSide { .. } | Self::Interrupted { .. } | Self::Script { .. } => self,
            other => Self::AtSide {
                side,
                row,
                source: Box::new(other),
            },
        }
    }

    /// Side the error was raised on, if known
    pub fn side(&self) -> Option<Side> {
        match self {
            Self::AtSide { side, .. } | Self::Script { side, .. } => Some(*side),
            _ => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}
