//! # tabcompare
//!
//! Streaming comparison of an expected and an actual tabular dataset read
//! from SQL queries, delimited files or script output. Every row ends up in
//! one of four buckets: passed, failed, not found or extra.

pub mod cancel;
pub mod categorizer;
pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod matcher;
pub mod numeric;
pub mod output;
pub mod progress;
pub mod reader;
pub mod result;
pub mod rows_comparator;
pub mod sql;
pub mod table_comparator;
pub mod value;

pub use cancel::CancellationToken;
pub use categorizer::ComparisonReport;
pub use compare::{CompareOptions, DataSetComparison};
pub use config::CompareSettings;
pub use error::{CompareError, Result};
pub use reader::{Side, TableDataReader};
pub use result::{RowComparison, RowComparisonResultType};
pub use table_comparator::TableDataComparator;
