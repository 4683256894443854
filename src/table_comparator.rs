//! Table data comparison over two row streams
//!
//! Without key columns both readers are walked in lock-step and position is
//! identity. With key columns the expected stream is indexed by primary key
//! first, then actual rows are looked up one at a time.

use crate::error::{CompareError, Result};
use crate::matcher::RowMatcher;
use crate::numeric::NumericColumns;
use crate::reader::{Side, TableDataReader};
use crate::result::{RowComparison, RowComparisonResultType};
use crate::rows_comparator::RowsComparator;
use crate::value::Row;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::time::Instant;

/// One emitted comparison together with the row it was produced from
#[derive(Debug, Clone)]
pub struct ComparedRow {
    /// 1-based emission index, for labelling only
    pub index: u64,
    pub comparison: RowComparison,
    /// The actual row for matched and extra rows, the expected row otherwise
    pub row: Row,
}

impl ComparedRow {
    /// Side the carried row was read from
    pub fn row_side(&self) -> Side {
        match self.comparison.result_type {
            RowComparisonResultType::NotFound => Side::Expected,
            _ => Side::Actual,
        }
    }
}

/// Expected rows indexed by primary key.
///
/// Rows stay in arrival order; every key maps to the positions of its
/// unconsumed rows, oldest first.
struct ExpectedIndex {
    matcher: RowMatcher,
    rows: Vec<Option<Row>>,
    by_key: IndexMap<String, VecDeque<usize>>,
    remaining: usize,
    cursor: usize,
}

impl ExpectedIndex {
    fn build(matcher: RowMatcher, expected: &mut TableDataReader) -> Result<Self> {
        let started = Instant::now();
        let mut rows = Vec::new();
        let mut by_key: IndexMap<String, VecDeque<usize>> = IndexMap::new();

        while expected.has_more_data()? {
            let row = expected.next_row()?;
            let key = matcher
                .primary_key(&row)
                .map_err(|e| e.at_side(Side::Expected, Some(expected.rows_read())))?;
            by_key.entry(key).or_default().push_back(rows.len());
            rows.push(Some(row));
        }

        log::debug!(
            "Indexed {} expected rows under {} keys in {:.3} sec.",
            rows.len(),
            by_key.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(Self {
            matcher,
            remaining: rows.len(),
            rows,
            by_key,
            cursor: 0,
        })
    }

    /// Take the oldest unconsumed row stored under a key
    fn take(&mut self, key: &str) -> Option<Row> {
        let position = self.by_key.get_mut(key)?.pop_front()?;
        self.remaining -= 1;
        self.rows[position].take()
    }

    fn has_unconsumed(&self) -> bool {
        self.remaining > 0
    }

    /// Next unconsumed row in original expected order
    fn next_unconsumed(&mut self) -> Option<Row> {
        while self.cursor < self.rows.len() {
            let position = self.cursor;
            self.cursor += 1;
            if let Some(row) = self.rows[position].take() {
                self.remaining -= 1;
                return Some(row);
            }
        }
        None
    }
}

enum Strategy {
    Ordered,
    Indexed(ExpectedIndex),
}

/// Pairs expected and actual rows and classifies each logical row
pub struct TableDataComparator {
    expected: TableDataReader,
    actual: TableDataReader,
    comparator: RowsComparator,
    strategy: Strategy,
    emitted: u64,
    closed: bool,
}

impl TableDataComparator {
    /// Positional comparison: row N of expected is compared with row N of actual
    pub fn ordered(
        expected: TableDataReader,
        actual: TableDataReader,
        numeric_columns: &NumericColumns,
    ) -> Self {
        Self {
            expected,
            actual,
            comparator: RowsComparator::new(numeric_columns),
            strategy: Strategy::Ordered,
            emitted: 0,
            closed: false,
        }
    }

    /// Key-based comparison. Consumes the whole expected stream before
    /// returning; both readers are closed if that fails.
    pub fn indexed(
        mut expected: TableDataReader,
        mut actual: TableDataReader,
        key_columns: Vec<String>,
        numeric_columns: &NumericColumns,
    ) -> Result<Self> {
        let matcher = RowMatcher::new(key_columns, numeric_columns);
        let built = Self::prepare_index(matcher, &mut expected, &mut actual);
        match built {
            Ok(index) => Ok(Self {
                expected,
                actual,
                comparator: RowsComparator::new(numeric_columns),
                strategy: Strategy::Indexed(index),
                emitted: 0,
                closed: false,
            }),
            Err(e) => {
                for reader in [&mut expected, &mut actual] {
                    if let Err(close_error) = reader.close() {
                        log::warn!("{}", close_error);
                    }
                }
                Err(e)
            }
        }
    }

    /// Ordered when no key columns are given, indexed otherwise
    pub fn new(
        expected: TableDataReader,
        actual: TableDataReader,
        key_columns: Vec<String>,
        numeric_columns: &NumericColumns,
    ) -> Result<Self> {
        if key_columns.is_empty() {
            Ok(Self::ordered(expected, actual, numeric_columns))
        } else {
            Self::indexed(expected, actual, key_columns, numeric_columns)
        }
    }

    fn prepare_index(
        matcher: RowMatcher,
        expected: &mut TableDataReader,
        actual: &mut TableDataReader,
    ) -> Result<ExpectedIndex> {
        let expected_header = expected.header()?;
        matcher.validate_header(&expected_header, Side::Expected)?;
        let actual_header = actual.header()?;
        matcher.validate_header(&actual_header, Side::Actual)?;
        ExpectedIndex::build(matcher, expected)
    }

    /// Matcher used for key derivation, present for indexed comparison only
    pub fn matcher(&self) -> Option<&RowMatcher> {
        match &self.strategy {
            Strategy::Ordered => None,
            Strategy::Indexed(index) => Some(&index.matcher),
        }
    }

    /// Number of rows emitted so far
    pub fn rows_compared(&self) -> u64 {
        self.emitted
    }

    pub fn has_more_rows(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        match &self.strategy {
            Strategy::Ordered => Ok(self.expected.has_more_data()? || self.actual.has_more_data()?),
            Strategy::Indexed(index) => {
                let unconsumed = index.has_unconsumed();
                Ok(self.actual.has_more_data()? || unconsumed)
            }
        }
    }

    /// Produce the verdict for the next logical row
    pub fn compare_rows(&mut self) -> Result<ComparedRow> {
        if self.closed {
            return Err(CompareError::source_failure("comparing rows", "comparator is closed"));
        }
        let (comparison, row) = match self.strategy {
            Strategy::Ordered => self.next_ordered()?,
            Strategy::Indexed(_) => self.next_indexed()?,
        };
        self.emitted += 1;
        Ok(ComparedRow {
            index: self.emitted,
            comparison,
            row,
        })
    }

    fn next_ordered(&mut self) -> Result<(RowComparison, Row)> {
        let has_expected = self.expected.has_more_data()?;
        let has_actual = self.actual.has_more_data()?;
        match (has_expected, has_actual) {
            (true, true) => {
                let expected = self.expected.next_row()?;
                let actual = self.actual.next_row()?;
                Ok((self.comparator.compare(&expected, &actual), actual))
            }
            (true, false) => {
                let expected = self.expected.next_row()?;
                Ok((RowComparison::not_found(expected.rendered()), expected))
            }
            (false, true) => {
                let actual = self.actual.next_row()?;
                Ok((RowComparison::extra(actual.rendered()), actual))
            }
            (false, false) => Err(no_more_rows()),
        }
    }

    fn next_indexed(&mut self) -> Result<(RowComparison, Row)> {
        let Strategy::Indexed(index) = &mut self.strategy else {
            return Err(no_more_rows());
        };

        if self.actual.has_more_data()? {
            let actual = self.actual.next_row()?;
            let key = index
                .matcher
                .primary_key(&actual)
                .map_err(|e| e.at_side(Side::Actual, Some(self.actual.rows_read())))?;
            return Ok(match index.take(&key) {
                Some(expected) => (self.comparator.compare(&expected, &actual), actual),
                None => (RowComparison::extra(actual.rendered()), actual),
            });
        }

        match index.next_unconsumed() {
            Some(expected) => Ok((RowComparison::not_found(expected.rendered()), expected)),
            None => Err(no_more_rows()),
        }
    }

    /// Close both readers once. Both are attempted even if the first fails;
    /// the first failure is returned.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let expected = self.expected.close();
        let actual = self.actual.close();
        match (expected, actual) {
            (Err(first), Err(second)) => {
                log::warn!("{}", second);
                Err(first)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

impl Drop for TableDataComparator {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close readers: {}", e);
        }
    }
}

fn no_more_rows() -> CompareError {
    CompareError::source_failure("comparing rows", "no more rows to compare")
}
