//! Aggregation of row verdicts into named buckets

use crate::result::{RowComparison, RowComparisonResultType};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display name of the bucket holding rows of a result type
pub fn bucket_name(result_type: RowComparisonResultType) -> &'static str {
    match result_type {
        RowComparisonResultType::Passed => "Passed rows",
        RowComparisonResultType::Failed => "Failed rows",
        RowComparisonResultType::NotFound => "Not found rows",
        RowComparisonResultType::Extra => "Extra rows",
    }
}

pub const BOTH_EMPTY_MESSAGE: &str = "Both datasets are empty. Nothing to compare.";

/// One categorized row
#[derive(Debug, Clone, Serialize)]
pub struct RowReport {
    pub label: String,
    pub result_type: RowComparisonResultType,
    /// Label of the earlier row this one repeats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<String>,
    pub comparison: RowComparison,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bucket {
    pub name: String,
    pub result_type: RowComparisonResultType,
    pub rows: Vec<RowReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Compared,
    BothEmpty,
}

/// Full outcome of one comparison run
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub status: ComparisonStatus,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
    pub total_rows: u64,
    pub passed_rows: u64,
    /// Always the four buckets, in passed, failed, not found, extra order
    pub buckets: Vec<Bucket>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ComparisonReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            status: ComparisonStatus::Compared,
            started_at,
            elapsed_seconds: 0.0,
            total_rows: 0,
            passed_rows: 0,
            buckets: RowComparisonResultType::ALL
                .iter()
                .map(|t| Bucket {
                    name: bucket_name(*t).to_string(),
                    result_type: *t,
                    rows: Vec::new(),
                })
                .collect(),
            warnings: Vec::new(),
        }
    }

    pub fn both_empty(started_at: DateTime<Utc>) -> Self {
        Self {
            status: ComparisonStatus::BothEmpty,
            ..Self::new(started_at)
        }
    }

    /// File a row under the bucket of its result type
    pub fn add(&mut self, row: RowReport) {
        self.total_rows += 1;
        if row.result_type == RowComparisonResultType::Passed {
            self.passed_rows += 1;
        }
        let result_type = row.result_type;
        if let Some(bucket) = self.buckets.iter_mut().find(|b| b.result_type == result_type) {
            bucket.rows.push(row);
        }
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn bucket(&self, result_type: RowComparisonResultType) -> &[RowReport] {
        self.buckets
            .iter()
            .find(|b| b.result_type == result_type)
            .map(|b| b.rows.as_slice())
            .unwrap_or(&[])
    }

    pub fn count(&self, result_type: RowComparisonResultType) -> usize {
        self.bucket(result_type).len()
    }

    pub fn failed_rows(&self) -> u64 {
        self.total_rows - self.passed_rows
    }

    /// True when every row passed, or there was nothing to compare
    pub fn is_success(&self) -> bool {
        self.passed_rows == self.total_rows
    }

    /// One-line summary of the run
    pub fn summary(&self) -> String {
        match self.status {
            ComparisonStatus::BothEmpty => BOTH_EMPTY_MESSAGE.to_string(),
            ComparisonStatus::Compared => format!(
                "Compared {} rows: {} passed, {} failed, {} not found, {} extra",
                self.total_rows,
                self.count(RowComparisonResultType::Passed),
                self.count(RowComparisonResultType::Failed),
                self.count(RowComparisonResultType::NotFound),
                self.count(RowComparisonResultType::Extra)
            ),
        }
    }

    /// Verdicts in emission order, across all buckets
    pub fn verdicts(&self) -> Vec<(String, RowComparisonResultType)> {
        let mut rows: Vec<&RowReport> = self.buckets.iter().flat_map(|b| b.rows.iter()).collect();
        rows.sort_by_key(|r| row_number(&r.label));
        rows.iter().map(|r| (r.label.clone(), r.result_type)).collect()
    }
}

fn row_number(label: &str) -> u64 {
    label
        .trim_start_matches("Row #")
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}
