//! Per-row comparison results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict for one logical row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowComparisonResultType {
    /// Matched, every column equal within tolerance
    Passed,
    /// Matched, at least one column differs
    Failed,
    /// Present in expected data only
    NotFound,
    /// Present in actual data only
    Extra,
}

impl RowComparisonResultType {
    pub const ALL: [RowComparisonResultType; 4] = [
        RowComparisonResultType::Passed,
        RowComparisonResultType::Failed,
        RowComparisonResultType::NotFound,
        RowComparisonResultType::Extra,
    ];
}

impl fmt::Display for RowComparisonResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::NotFound => "NOT_FOUND",
            Self::Extra => "EXTRA",
        };
        f.write_str(name)
    }
}

/// Expected and actual value of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnComparison {
    pub column: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub identical: bool,
    /// Why the values could not be compared normally, if they could not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ColumnComparison {
    pub fn new(
        column: impl Into<String>,
        expected: Option<String>,
        actual: Option<String>,
        identical: bool,
    ) -> Self {
        Self {
            column: column.into(),
            expected,
            actual,
            identical,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// One-line description of the difference
    pub fn describe(&self) -> String {
        match &self.note {
            Some(note) => format!("Column '{}': {}", self.column, note),
            None => format!(
                "Column '{}': expected '{}' but was '{}'",
                self.column,
                self.expected.as_deref().unwrap_or("null"),
                self.actual.as_deref().unwrap_or("null")
            ),
        }
    }
}

/// Outcome of comparing one logical row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowComparison {
    pub result_type: RowComparisonResultType,
    pub details: Vec<ColumnComparison>,
}

impl RowComparison {
    /// Result for a matched pair; the verdict follows from the details
    pub fn matched(details: Vec<ColumnComparison>) -> Self {
        let passed = details.iter().all(|d| d.identical);
        Self {
            result_type: if passed {
                RowComparisonResultType::Passed
            } else {
                RowComparisonResultType::Failed
            },
            details,
        }
    }

    /// Result for a row present on the expected side only
    pub fn not_found(values: Vec<(String, Option<String>)>) -> Self {
        Self {
            result_type: RowComparisonResultType::NotFound,
            details: values
                .into_iter()
                .map(|(column, value)| ColumnComparison::new(column, value, None, false))
                .collect(),
        }
    }

    /// Result for a row present on the actual side only
    pub fn extra(values: Vec<(String, Option<String>)>) -> Self {
        Self {
            result_type: RowComparisonResultType::Extra,
            details: values
                .into_iter()
                .map(|(column, value)| ColumnComparison::new(column, None, value, false))
                .collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_type == RowComparisonResultType::Passed
    }

    /// Human-readable description of every difference in a matched row
    pub fn mismatches(&self) -> Vec<String> {
        if !matches!(
            self.result_type,
            RowComparisonResultType::Passed | RowComparisonResultType::Failed
        ) {
            return Vec::new();
        }
        self.details
            .iter()
            .filter(|d| !d.identical)
            .map(ColumnComparison::describe)
            .collect()
    }
}

impl fmt::Display for RowComparison {
    /// Detail view: one line per column with both values
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.result_type)?;
        for detail in &self.details {
            let marker = if detail.identical { ' ' } else { '*' };
            writeln!(
                f,
                "{} {}: {} | {}",
                marker,
                detail.column,
                detail.expected.as_deref().unwrap_or(""),
                detail.actual.as_deref().unwrap_or("")
            )?;
            if let Some(note) = &detail.note {
                writeln!(f, "    ({})", note)?;
            }
        }
        Ok(())
    }
}
