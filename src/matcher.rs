//! Row matching by key columns

use crate::error::{CompareError, Result};
use crate::numeric::{parse_decimal, round_to_scale, NumericColumns};
use crate::reader::Side;
use crate::value::{Header, Row};

/// Separates column values inside derived keys
const KEY_SEPARATOR: char = '\u{1f}';

/// Leads every present value in a secondary key, so an absent value never
/// collides with an empty one
const PRESENT_TAG: char = '=';

/// Derives row identities for key-based matching.
///
/// The primary key is built from the key columns only, in declaration
/// order. The secondary key covers every column of the row and is used to
/// tell true duplicates from rows that merely share key values.
#[derive(Debug, Clone)]
pub enum RowMatcher {
    /// Keys use the literal string value of each column
    Exact { key_columns: Vec<String> },
    /// Numeric columns contribute their value rounded to the configured scale
    Numeric {
        key_columns: Vec<String>,
        numeric_columns: NumericColumns,
    },
}

impl RowMatcher {
    /// Pick the strategy from the presence of a numeric specification
    pub fn new(key_columns: Vec<String>, numeric_columns: &NumericColumns) -> Self {
        if numeric_columns.is_empty() {
            RowMatcher::Exact { key_columns }
        } else {
            RowMatcher::Numeric {
                key_columns,
                numeric_columns: numeric_columns.clone(),
            }
        }
    }

    pub fn key_columns(&self) -> &[String] {
        match self {
            RowMatcher::Exact { key_columns } | RowMatcher::Numeric { key_columns, .. } => key_columns,
        }
    }

    /// Check that every key column exists in a header
    pub fn validate_header(&self, header: &Header, side: Side) -> Result<()> {
        let missing: Vec<&str> = self
            .key_columns()
            .iter()
            .filter(|c| !header.contains(c))
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CompareError::config(
                crate::config::KEY_COLUMNS,
                format!("column(s) {} not found in {} data", missing.join(", "), side),
            ))
        }
    }

    /// Absent and blank key values both give an empty fragment
    pub fn primary_key(&self, row: &Row) -> Result<String> {
        self.join_fragments(row, self.key_columns().iter().map(String::as_str), false)
    }

    /// Every column, with absent values kept apart from empty ones
    pub fn secondary_key(&self, row: &Row) -> Result<String> {
        self.join_fragments(row, row.header().names(), true)
    }

    /// True when `row` has the given secondary key
    pub fn matches_by_secondary_key(&self, candidate_key: &str, row: &Row) -> Result<bool> {
        Ok(self.secondary_key(row)? == candidate_key)
    }

    fn join_fragments<'a>(
        &self,
        row: &Row,
        columns: impl Iterator<Item = &'a str>,
        tag_present: bool,
    ) -> Result<String> {
        let mut key = String::new();
        for (i, column) in columns.enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            if let Some(text) = row.text(column) {
                if tag_present {
                    key.push(PRESENT_TAG);
                }
                key.push_str(&self.fragment(text, column)?);
            }
        }
        Ok(key)
    }

    fn fragment(&self, text: String, column: &str) -> Result<String> {
        let scale = match self {
            RowMatcher::Exact { .. } => None,
            RowMatcher::Numeric {
                numeric_columns, ..
            } => numeric_columns.scale(column),
        };

        match scale {
            Some(scale) if !text.trim().is_empty() => {
                let value = parse_decimal(&text).ok_or_else(|| CompareError::NumericParse {
                    column: column.to_string(),
                    value: text.clone(),
                })?;
                Ok(round_to_scale(value, scale).to_string())
            }
            _ => Ok(text),
        }
    }
}
