//! Cell-by-cell comparison of two matched rows

use crate::numeric::{equal_at_scale, parse_decimal, NumericColumns};
use crate::result::{ColumnComparison, RowComparison};
use crate::value::Row;

/// Equality policy applied to every column of a matched pair
#[derive(Debug, Clone)]
pub enum RowsComparator {
    /// Case-sensitive equality of the rendered values
    Exact,
    /// Decimal equality at the configured scale for numeric columns,
    /// exact equality for the rest
    Numeric(NumericColumns),
}

impl RowsComparator {
    /// Pick the strategy from the presence of a numeric specification
    pub fn new(numeric_columns: &NumericColumns) -> Self {
        if numeric_columns.is_empty() {
            RowsComparator::Exact
        } else {
            RowsComparator::Numeric(numeric_columns.clone())
        }
    }

    /// Compare every column present in either row.
    ///
    /// Columns come in expected header order followed by columns only the
    /// actual row has.
    pub fn compare(&self, expected: &Row, actual: &Row) -> RowComparison {
        let expected_header = expected.header();
        let actual_header = actual.header();
        let columns = expected_header
            .names()
            .chain(actual_header.names().filter(|c| !expected_header.contains(c)));

        let details = columns
            .map(|column| self.compare_column(column, expected, actual))
            .collect();
        RowComparison::matched(details)
    }

    fn compare_column(&self, column: &str, expected: &Row, actual: &Row) -> ColumnComparison {
        let expected_value = expected.text(column);
        let actual_value = actual.text(column);

        if !expected.has_column(column) {
            return ColumnComparison::new(column, None, actual_value, false)
                .with_note("missing in expected data");
        }
        if !actual.has_column(column) {
            return ColumnComparison::new(column, expected_value, None, false)
                .with_note("missing in actual data");
        }

        match (self, &expected_value, &actual_value) {
            (RowsComparator::Numeric(numeric), Some(e), Some(a)) if e != a => {
                match numeric.scale(column) {
                    Some(scale) => compare_numeric(column, e, a, scale),
                    None => ColumnComparison::new(column, expected_value.clone(), actual_value.clone(), false),
                }
            }
            _ => {
                let identical = expected_value == actual_value;
                ColumnComparison::new(column, expected_value, actual_value, identical)
            }
        }
    }
}

fn compare_numeric(column: &str, expected: &str, actual: &str, scale: u32) -> ColumnComparison {
    let detail = |identical| {
        ColumnComparison::new(column, Some(expected.to_string()), Some(actual.to_string()), identical)
    };
    match (parse_decimal(expected), parse_decimal(actual)) {
        (Some(e), Some(a)) => detail(equal_at_scale(e, a, scale)),
        (None, _) => detail(false).with_note(format!(
            "expected value '{}' is not a valid number",
            expected
        )),
        (_, None) => detail(false).with_note(format!(
            "actual value '{}' is not a valid number",
            actual
        )),
    }
}
