//! Duplicate row detection by key columns

use crate::error::Result;
use crate::matcher::RowMatcher;
use crate::value::Row;
use indexmap::IndexMap;

/// Identity of a row already seen under some primary key
#[derive(Debug, Clone)]
pub struct CollectedRow {
    pub label: String,
    pub secondary_key: String,
    pub content: Vec<(String, Option<String>)>,
}

/// Remembers processed rows by primary key so repeated rows can be named.
///
/// Entries are only ever appended.
#[derive(Debug, Default)]
pub struct DuplicateRowCollector {
    rows: IndexMap<String, Vec<CollectedRow>>,
}

impl DuplicateRowCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label of an earlier row that `row` duplicates, if any.
    ///
    /// Rows sharing the primary key but differing anywhere else are not
    /// duplicates.
    pub fn check_for_duplicate(
        &self,
        primary_key: &str,
        row: &Row,
        matcher: &RowMatcher,
    ) -> Result<Option<String>> {
        let Some(candidates) = self.rows.get(primary_key) else {
            return Ok(None);
        };
        for candidate in candidates {
            if matcher.matches_by_secondary_key(&candidate.secondary_key, row)? {
                return Ok(Some(candidate.label.clone()));
            }
        }
        Ok(None)
    }

    /// Track a row that was not a duplicate
    pub fn add_row(
        &mut self,
        label: impl Into<String>,
        primary_key: impl Into<String>,
        row: &Row,
        matcher: &RowMatcher,
    ) -> Result<()> {
        let collected = CollectedRow {
            label: label.into(),
            secondary_key: matcher.secondary_key(row)?,
            content: row.rendered(),
        };
        self.rows.entry(primary_key.into()).or_default().push(collected);
        Ok(())
    }

    /// Rows tracked under a primary key, oldest first
    pub fn rows_for(&self, primary_key: &str) -> &[CollectedRow] {
        self.rows.get(primary_key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
