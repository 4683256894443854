//! Command-line interface for tabcompare

use crate::config::{
    RawParams, ACTUAL_FORMAT, ACTUAL_SOURCE, CHECK_DUPLICATES, CSV_DELIMITER, DATABASE,
    EXPECTED_FORMAT, EXPECTED_SOURCE, KEY_COLUMNS, SCRIPT_FILE_PARAMS, SCRIPT_SHELL_NAME,
    SCRIPT_SHELL_OPTION,
};
use crate::numeric::NUMERIC_COLUMNS;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabcompare")]
#[command(about = "Compare expected and actual tabular datasets row by row")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare an expected dataset with an actual one
    Compare(CompareArgs),

    /// Show the columns of a data source
    Describe {
        /// Source format: Query, QueryFile, CsvFile, Script or ScriptFile
        #[arg(long)]
        format: String,

        /// Query, file path or shell commands, depending on the format
        #[arg(long)]
        source: String,

        /// Delimiter of delimited sources
        #[arg(long)]
        delimiter: Option<String>,

        /// DuckDB database file for query sources
        #[arg(long)]
        db: Option<PathBuf>,

        /// Print the columns as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct CompareArgs {
    /// Format of the expected source
    #[arg(long)]
    pub expected_format: Option<String>,

    /// Expected source: query, file path or shell commands
    #[arg(long)]
    pub expected: Option<String>,

    /// Format of the actual source
    #[arg(long)]
    pub actual_format: Option<String>,

    /// Actual source: query, file path or shell commands
    #[arg(long)]
    pub actual: Option<String>,

    /// Comma-separated key columns; rows are matched by position without them
    #[arg(long)]
    pub key_columns: Option<String>,

    /// Comma-separated numeric columns with scale, e.g. "amount:2,qty"
    #[arg(long)]
    pub numeric_columns: Option<String>,

    /// Report repeated actual rows sharing a key
    #[arg(long)]
    pub check_duplicates: bool,

    /// Delimiter for both sides; "\t" means tab
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Delimiter for the expected side
    #[arg(long)]
    pub expected_delimiter: Option<String>,

    /// Delimiter for the actual side
    #[arg(long)]
    pub actual_delimiter: Option<String>,

    /// Shell running inline scripts
    #[arg(long)]
    pub shell: Option<String>,

    /// Shell option preceding inline script commands
    #[arg(long, allow_hyphen_values = true)]
    pub shell_option: Option<String>,

    /// Arguments passed to script files
    #[arg(long, allow_hyphen_values = true)]
    pub script_params: Option<String>,

    /// DuckDB database file for both sides
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// DuckDB database file for the expected side
    #[arg(long)]
    pub expected_db: Option<PathBuf>,

    /// DuckDB database file for the actual side
    #[arg(long)]
    pub actual_db: Option<PathBuf>,

    /// JSON file with parameters; flags override its values
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Output format: "pretty", "json"
    #[arg(long, default_value = "pretty")]
    pub format: String,

    /// Write the JSON report to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// List passed rows in pretty output
    #[arg(long)]
    pub show_passed: bool,
}

impl CompareArgs {
    /// Lay the flags over already loaded parameters
    pub fn apply_to(&self, params: &mut RawParams) {
        let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());
        let overrides = [
            (EXPECTED_FORMAT, self.expected_format.clone()),
            (EXPECTED_SOURCE, self.expected.clone()),
            (ACTUAL_FORMAT, self.actual_format.clone()),
            (ACTUAL_SOURCE, self.actual.clone()),
            (KEY_COLUMNS, self.key_columns.clone()),
            (NUMERIC_COLUMNS, self.numeric_columns.clone()),
            (CSV_DELIMITER.common, self.delimiter.clone()),
            (CSV_DELIMITER.expected, self.expected_delimiter.clone()),
            (CSV_DELIMITER.actual, self.actual_delimiter.clone()),
            (SCRIPT_SHELL_NAME.common, self.shell.clone()),
            (SCRIPT_SHELL_OPTION.common, self.shell_option.clone()),
            (SCRIPT_FILE_PARAMS.common, self.script_params.clone()),
            (DATABASE.common, path(&self.db)),
            (DATABASE.expected, path(&self.expected_db)),
            (DATABASE.actual, path(&self.actual_db)),
        ];
        for (name, value) in overrides {
            if let Some(value) = value {
                params.insert(name.to_string(), value);
            }
        }
        if self.check_duplicates {
            params.insert(CHECK_DUPLICATES.to_string(), "true".to_string());
        }
    }
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}
