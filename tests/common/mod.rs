//! Common test utilities and helpers

use std::fs;
use std::path::{Path, PathBuf};
use tabcompare::compare::NoProgress;
use tabcompare::config::{RawParams, ACTUAL_FORMAT, ACTUAL_SOURCE, EXPECTED_FORMAT, EXPECTED_SOURCE};
use tabcompare::reader::factory::DuckDbConnections;
use tabcompare::{CompareSettings, ComparisonReport, DataSetComparison, Result, RowComparisonResultType};
use tempfile::TempDir;

/// Test fixture manager for creating temporary test environments
pub struct TestFixture {
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Get the root path of the test fixture
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a CSV file from rows of cells, the first row being the header
    pub fn create_csv(&self, name: &str, data: &[Vec<&str>]) -> Result<PathBuf> {
        self.create_csv_with_delimiter(name, data, ',')
    }

    pub fn create_csv_with_delimiter(&self, name: &str, data: &[Vec<&str>], delimiter: char) -> Result<PathBuf> {
        let mut content = String::new();
        for row in data {
            content.push_str(&row.join(&delimiter.to_string()));
            content.push('\n');
        }
        self.create_file(name, &content)
    }

    /// Create a file with raw content
    pub fn create_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.root().join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Create an executable shell script
    #[cfg(unix)]
    pub fn create_script(&self, name: &str, body: &str) -> Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let path = self.create_file(name, &format!("#!/bin/sh\n{}\n", body))?;
        let mut permissions = fs::metadata(&path)?.permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions)?;
        Ok(path)
    }

    /// Create a JSON parameters file
    pub fn create_params(&self, name: &str, params: &serde_json::Value) -> Result<PathBuf> {
        self.create_file(name, &serde_json::to_string_pretty(params)?)
    }

    pub fn path_str(&self, name: &str) -> String {
        self.root().join(name).to_string_lossy().into_owned()
    }
}

/// Parameters comparing two files of the given format
pub fn params(expected_format: &str, expected: &str, actual_format: &str, actual: &str) -> RawParams {
    let mut params = RawParams::new();
    params.insert(EXPECTED_FORMAT.into(), expected_format.into());
    params.insert(EXPECTED_SOURCE.into(), expected.into());
    params.insert(ACTUAL_FORMAT.into(), actual_format.into());
    params.insert(ACTUAL_SOURCE.into(), actual.into());
    params
}

/// Run a full comparison from raw parameters
pub fn run_params(params: &RawParams) -> Result<ComparisonReport> {
    let settings = CompareSettings::from_params(params)?;
    DataSetComparison::from_settings(&settings).run_sources(&settings, &DuckDbConnections, &mut NoProgress)
}

/// Compare two CSV fixtures with extra parameters
pub fn compare_csv(
    fixture: &TestFixture,
    expected: &[Vec<&str>],
    actual: &[Vec<&str>],
    extra: &[(&str, &str)],
) -> Result<ComparisonReport> {
    let expected_path = fixture.create_csv("expected.csv", expected)?;
    let actual_path = fixture.create_csv("actual.csv", actual)?;
    let mut raw = params(
        "CsvFile",
        &expected_path.to_string_lossy(),
        "CsvFile",
        &actual_path.to_string_lossy(),
    );
    for (name, value) in extra {
        raw.insert(name.to_string(), value.to_string());
    }
    run_params(&raw)
}

/// Result types in emission order
pub fn verdict_types(report: &ComparisonReport) -> Vec<RowComparisonResultType> {
    report.verdicts().into_iter().map(|(_, t)| t).collect()
}

/// Helper for running CLI commands in tests
pub struct CliTestRunner {
    fixture: TestFixture,
}

impl CliTestRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fixture: TestFixture::new()?,
        })
    }

    pub fn fixture(&self) -> &TestFixture {
        &self.fixture
    }

    /// Run a tabcompare command, returning whether it succeeded
    pub fn run_command(&self, args: &[&str]) -> Result<bool> {
        use clap::Parser;
        use tabcompare::cli::Cli;
        use tabcompare::commands::execute_command;

        let mut cmd_args = vec!["tabcompare"];
        cmd_args.extend(args);

        let cli = Cli::try_parse_from(cmd_args)
            .map_err(|e| tabcompare::CompareError::config("command line", e.to_string()))?;
        execute_command(cli.command)
    }

    /// Run a command and expect it to succeed
    pub fn expect_success(&self, args: &[&str]) {
        assert!(self.run_command(args).expect("Command should run"), "Command should succeed");
    }

    /// Run a command that completes but reports a failed comparison
    pub fn expect_mismatch(&self, args: &[&str]) {
        assert!(!self.run_command(args).expect("Command should run"), "Comparison should fail");
    }

    /// Run a command and expect it to fail with an error
    pub fn expect_failure(&self, args: &[&str]) -> tabcompare::CompareError {
        self.run_command(args).expect_err("Command should fail")
    }
}

/// Sample data generators for testing
pub mod sample_data {
    pub fn trades() -> Vec<Vec<&'static str>> {
        vec![
            vec!["id", "symbol", "amount"],
            vec!["1", "AAPL", "10.50"],
            vec!["2", "MSFT", "20.00"],
            vec!["3", "GOOG", "30.25"],
        ]
    }

    /// Same trades in another order, one amount changed, GOOG gone, TSLA added
    pub fn trades_changed() -> Vec<Vec<&'static str>> {
        vec![
            vec!["id", "symbol", "amount"],
            vec!["2", "MSFT", "20.00"],
            vec!["4", "TSLA", "40.00"],
            vec!["1", "AAPL", "10.55"],
        ]
    }
}
