//! Comparison run orchestration
//!
//! Drives a [`TableDataComparator`] to completion, labels every row, checks
//! actual-side duplicates when asked to, polls for cancellation and files
//! every verdict into a [`ComparisonReport`].

use crate::cancel::CancellationToken;
use crate::categorizer::{ComparisonReport, RowReport};
use crate::config::CompareSettings;
use crate::duplicates::DuplicateRowCollector;
use crate::error::{CompareError, Result};
use crate::matcher::RowMatcher;
use crate::numeric::NumericColumns;
use crate::reader::factory::ConnectionProvider;
use crate::reader::{open_reader, Side, TableDataReader};
use crate::result::RowComparisonResultType;
use crate::table_comparator::{ComparedRow, TableDataComparator};
use chrono::Utc;
use std::time::Instant;

/// Rows between two cancellation checks
pub const CANCELLATION_CHECK_INTERVAL: u64 = 1000;

/// Validated comparison parameters
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub key_columns: Vec<String>,
    pub numeric_columns: NumericColumns,
    pub check_duplicates: bool,
}

/// Receives a notification after every compared row
pub trait RowObserver {
    fn row_compared(&mut self, rows: u64, passed: u64);
}

/// Observer that ignores all notifications
pub struct NoProgress;

impl RowObserver for NoProgress {
    fn row_compared(&mut self, _rows: u64, _passed: u64) {}
}

impl<F: FnMut(u64, u64)> RowObserver for F {
    fn row_compared(&mut self, rows: u64, passed: u64) {
        self(rows, passed)
    }
}

pub struct DataSetComparison {
    options: CompareOptions,
    cancellation: CancellationToken,
}

impl DataSetComparison {
    pub fn new(options: CompareOptions) -> Self {
        Self {
            options,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn from_settings(settings: &CompareSettings) -> Self {
        Self::new(settings.options.clone())
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Build both readers from settings and compare them
    pub fn run_sources(
        &self,
        settings: &CompareSettings,
        connections: &dyn ConnectionProvider,
        observer: &mut dyn RowObserver,
    ) -> Result<ComparisonReport> {
        let expected = open_reader(&settings.expected, connections)?;
        let actual = open_reader(&settings.actual, connections)?;
        self.run(expected, actual, observer)
    }

    /// Compare two datasets. Both readers are closed before returning,
    /// whatever the outcome; close failures become report warnings.
    pub fn run(
        &self,
        expected: TableDataReader,
        actual: TableDataReader,
        observer: &mut dyn RowObserver,
    ) -> Result<ComparisonReport> {
        let mut comparator = TableDataComparator::new(
            expected,
            actual,
            self.options.key_columns.clone(),
            &self.options.numeric_columns,
        )?;

        let outcome = self.drive(&mut comparator, observer);
        match (outcome, comparator.close()) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(mut report), Err(close_error)) => {
                log::warn!("Failed to close readers: {}", close_error);
                report.warn(format!("Failed to close readers: {}", close_error));
                Ok(report)
            }
            (Err(e), Err(close_error)) => {
                log::warn!("Failed to close readers: {}", close_error);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }

    fn drive(
        &self,
        comparator: &mut TableDataComparator,
        observer: &mut dyn RowObserver,
    ) -> Result<ComparisonReport> {
        let started_at = Utc::now();
        if !comparator.has_more_rows()? {
            log::debug!("Both datasets are empty");
            return Ok(ComparisonReport::both_empty(started_at));
        }

        let matcher = match (self.options.check_duplicates, comparator.matcher()) {
            (true, Some(matcher)) => Some(matcher.clone()),
            (true, None) => {
                log::debug!("Duplicate check skipped: no key columns given");
                None
            }
            (false, _) => None,
        };
        let mut duplicates = DuplicateCheck {
            matcher,
            collector: DuplicateRowCollector::new(),
        };

        let started = Instant::now();
        let mut report = ComparisonReport::new(started_at);
        loop {
            let compared = comparator.compare_rows()?;
            let index = compared.index;
            log_mismatches(&compared);

            report.add(duplicates.categorize(compared)?);
            observer.row_compared(index, report.passed_rows);
            self.after_row(index, report.passed_rows)?;

            if !comparator.has_more_rows()? {
                break;
            }
        }

        report.elapsed_seconds = started.elapsed().as_secs_f64();
        log::debug!(
            "Comparison finished in {:.3} sec. Processed {} rows: {} passed / {} failed",
            report.elapsed_seconds,
            report.total_rows,
            report.passed_rows,
            report.failed_rows()
        );
        Ok(report)
    }

    fn after_row(&self, rows: u64, passed: u64) -> Result<()> {
        if is_progress_milestone(rows) {
            log::debug!("Compared {} rows, {} passed", rows, passed);
        }
        if rows % CANCELLATION_CHECK_INTERVAL == 0 && self.cancellation.is_cancelled() {
            log::warn!("Comparison interrupted after {} rows", rows);
            return Err(CompareError::Interrupted { rows });
        }
        Ok(())
    }
}

struct DuplicateCheck {
    matcher: Option<RowMatcher>,
    collector: DuplicateRowCollector,
}

impl DuplicateCheck {
    /// Turn a compared row into its report entry, downgrading repeats of an
    /// earlier actual row to FAILED
    fn categorize(&mut self, compared: ComparedRow) -> Result<RowReport> {
        let label = format!("Row #{}", compared.index);
        let matcher = match &self.matcher {
            Some(matcher) if compared.row_side() == Side::Actual => matcher,
            _ => return Ok(plain_report(label, compared)),
        };

        let row_number = Some(compared.index);
        let primary_key = matcher
            .primary_key(&compared.row)
            .map_err(|e| e.at_side(Side::Actual, row_number))?;
        let original = self
            .collector
            .check_for_duplicate(&primary_key, &compared.row, matcher)
            .map_err(|e| e.at_side(Side::Actual, row_number))?;

        match original {
            Some(original) => {
                log::warn!("{} duplicates row named '{}'", label, original);
                Ok(RowReport {
                    label: format!("{} (duplicate of row named '{}')", label, original),
                    result_type: RowComparisonResultType::Failed,
                    duplicate_of: Some(original),
                    comparison: compared.comparison,
                })
            }
            None => {
                self.collector
                    .add_row(label.clone(), primary_key, &compared.row, matcher)
                    .map_err(|e| e.at_side(Side::Actual, row_number))?;
                Ok(plain_report(label, compared))
            }
        }
    }
}

fn plain_report(label: String, compared: ComparedRow) -> RowReport {
    RowReport {
        label,
        result_type: compared.comparison.result_type,
        duplicate_of: None,
        comparison: compared.comparison,
    }
}

fn log_mismatches(compared: &ComparedRow) {
    if !log::log_enabled!(log::Level::Warn) {
        return;
    }
    let mismatches = compared.comparison.mismatches();
    if mismatches.is_empty() {
        return;
    }
    let mut message = format!("Comparison error(s) at row #{}:", compared.index);
    for mismatch in mismatches {
        message.push_str("\n* ");
        message.push_str(&mismatch);
    }
    log::warn!("{}", message);
}

/// Every 1k rows up to 10k, every 10k up to 100k, every 100k up to 1M,
/// then every 1M
pub fn is_progress_milestone(rows: u64) -> bool {
    rows > 0
        && ((rows <= 10_000 && rows % 1_000 == 0)
            || (rows <= 100_000 && rows % 10_000 == 0)
            || (rows <= 1_000_000 && rows % 100_000 == 0)
            || rows % 1_000_000 == 0)
}
