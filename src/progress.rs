//! Progress reporting for comparison runs

use crate::compare::RowObserver;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Rows between two spinner message refreshes
const REFRESH_INTERVAL: u64 = 100;

/// Spinner showing how many rows were compared and passed
pub struct ProgressReporter {
    rows_pb: Option<ProgressBar>,
    rows: u64,
    passed: u64,
}

impl ProgressReporter {
    /// Reporter with a live spinner
    pub fn new_for_compare() -> Self {
        Self {
            rows_pb: Some(create_spinner("Reading data...")),
            rows: 0,
            passed: 0,
        }
    }

    /// Reporter that draws nothing, for machine-readable output
    pub fn new_minimal() -> Self {
        Self {
            rows_pb: None,
            rows: 0,
            passed: 0,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.rows_pb.is_some()
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Stop the spinner, leaving a final message
    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.rows_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl RowObserver for ProgressReporter {
    fn row_compared(&mut self, rows: u64, passed: u64) {
        self.rows = rows;
        self.passed = passed;
        if rows % REFRESH_INTERVAL != 0 {
            return;
        }
        if let Some(pb) = &self.rows_pb {
            pb.set_message(format!("Compared {} rows, {} passed", rows, passed));
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.rows_pb.take() {
            pb.finish_and_clear();
        }
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
