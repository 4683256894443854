//! Pull-based table data readers
//!
//! A [`RowSource`] wraps one backing provider (query result, delimited text,
//! process output). [`TableDataReader`] puts the provider behind a small state
//! machine: nothing touches the provider until the header or the first row is
//! requested, the header is built once, and closing is idempotent.

pub mod db;
pub mod delimited;
pub mod factory;
pub mod script;

use crate::error::{CompareError, Result};
use crate::value::{Header, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use factory::{open_reader, SourceFormat};

/// Which dataset a reader or error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Expected,
    Actual,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Expected => f.write_str("expected"),
            Side::Actual => f.write_str("actual"),
        }
    }
}

/// One backing provider of raw records
pub trait RowSource {
    /// Run the underlying query or open the underlying input and describe
    /// its columns. Called exactly once, on first use.
    fn open(&mut self) -> Result<Header>;

    /// Move to the next raw record, returning false at the end of data
    fn advance(&mut self) -> Result<bool>;

    /// Materialize the current raw record as a typed row
    fn read_row(&mut self, header: &Arc<Header>) -> Result<Row>;

    /// Release cursors, statements, handles. Must tolerate repeated calls.
    fn close(&mut self) -> Result<()>;

    /// Short human-readable description used in log messages
    fn describe(&self) -> String;
}

/// Predicate deciding whether a materialized row is surfaced
pub type RowFilter = Box<dyn Fn(&Row) -> bool>;

enum ReaderState {
    Unopened,
    Open { header: Arc<Header> },
    Exhausted { header: Arc<Header> },
    Failed,
    Closed,
}

/// Lazily evaluated row stream over a [`RowSource`]
pub struct TableDataReader {
    side: Side,
    source: Box<dyn RowSource>,
    state: ReaderState,
    filter: Option<RowFilter>,
    pending: Option<Row>,
    rows_read: u64,
}

impl TableDataReader {
    /// Wrap a source. Construction is cheap: the source is not opened here.
    pub fn new(side: Side, source: Box<dyn RowSource>) -> Self {
        Self {
            side,
            source,
            state: ReaderState::Unopened,
            filter: None,
            pending: None,
            rows_read: 0,
        }
    }

    /// Skip rows the predicate rejects. Skipped rows are not counted.
    pub fn with_filter(mut self, filter: impl Fn(&Row) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of rows surfaced so far
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Header of the stream, opening the source on first access
    pub fn header(&mut self) -> Result<Arc<Header>> {
        match &self.state {
            ReaderState::Open { header } | ReaderState::Exhausted { header } => Ok(header.clone()),
            ReaderState::Unopened => self.open(),
            ReaderState::Failed => Err(self.unusable("reading header")),
            ReaderState::Closed => Err(self.closed("reading header")),
        }
    }

    /// Advance to the next surfaced row, reporting whether one is available.
    ///
    /// Calling this again before [`next_row`](Self::next_row) does not skip
    /// the pending row.
    pub fn has_more_data(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }

        let header = match &self.state {
            ReaderState::Open { header } => header.clone(),
            ReaderState::Exhausted { .. } => return Ok(false),
            ReaderState::Unopened => self.open()?,
            ReaderState::Failed => return Err(self.unusable("reading data")),
            ReaderState::Closed => return Err(self.closed("reading data")),
        };

        loop {
            let row_number = self.rows_read + 1;
            let advanced = self
                .source
                .advance()
                .and_then(|more| {
                    if more {
                        self.source.read_row(&header).map(Some)
                    } else {
                        Ok(None)
                    }
                })
                .map_err(|e| self.fail(e, Some(row_number)))?;

            match advanced {
                None => {
                    log::debug!(
                        "{} data exhausted after {} rows from {}",
                        self.side,
                        self.rows_read,
                        self.source.describe()
                    );
                    self.state = ReaderState::Exhausted { header };
                    return Ok(false);
                }
                Some(row) => {
                    if self.filter.as_ref().map_or(true, |f| f(&row)) {
                        self.rows_read += 1;
                        self.pending = Some(row);
                        return Ok(true);
                    }
                }
            }
        }
    }

    /// Take the row made available by [`has_more_data`](Self::has_more_data)
    pub fn next_row(&mut self) -> Result<Row> {
        if self.pending.is_none() && !self.has_more_data()? {
            return Err(CompareError::source_failure("reading row", "no more data available")
                .at_side(self.side, Some(self.rows_read + 1)));
        }
        self.pending.take().ok_or_else(|| {
            CompareError::source_failure("reading row", "no row available")
                .at_side(self.side, Some(self.rows_read + 1))
        })
    }

    /// Release the source. Safe to call repeatedly and after failures.
    pub fn close(&mut self) -> Result<()> {
        if matches!(self.state, ReaderState::Closed) {
            return Ok(());
        }
        let was_unopened = matches!(self.state, ReaderState::Unopened);
        self.state = ReaderState::Closed;
        self.pending = None;
        if was_unopened {
            return Ok(());
        }
        log::debug!("Closing {} reader for {}", self.side, self.source.describe());
        self.source.close().map_err(|e| e.at_side(self.side, None))
    }

    fn open(&mut self) -> Result<Arc<Header>> {
        let header = self.source.open().map_err(|e| self.fail(e, None))?;
        log::debug!(
            "{} header built from {}: {} columns",
            self.side,
            self.source.describe(),
            header.len()
        );
        let header = Arc::new(header);
        self.state = ReaderState::Open {
            header: header.clone(),
        };
        Ok(header)
    }

    fn fail(&mut self, error: CompareError, row: Option<u64>) -> CompareError {
        self.state = ReaderState::Failed;
        error.at_side(self.side, row)
    }

    fn unusable(&self, operation: &str) -> CompareError {
        CompareError::source_failure(operation, "reader failed earlier and is unusable")
            .at_side(self.side, None)
    }

    fn closed(&self, operation: &str) -> CompareError {
        CompareError::source_failure(operation, "reader is closed").at_side(self.side, None)
    }
}

impl Drop for TableDataReader {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close {} reader: {}", self.side, e);
        }
    }
}
