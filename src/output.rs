//! Output formatting utilities

use crate::categorizer::{ComparisonReport, ComparisonStatus, RowReport};
use crate::error::Result;
use crate::result::RowComparisonResultType;
use crate::value::Header;
use serde_json::json;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Rows listed per bucket before the rest is summarized
const MAX_ROWS_PER_BUCKET: usize = 20;

/// Pretty printer for comparison output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print a comparison report
    pub fn print_report(report: &ComparisonReport, show_passed: bool) {
        print!("{}", Self::render_report(report, show_passed));
    }

    /// Render a comparison report as a tree. Passed rows are listed only
    /// when asked for.
    pub fn render_report(report: &ComparisonReport, show_passed: bool) -> String {
        let mut out = String::new();
        if report.status == ComparisonStatus::BothEmpty {
            let _ = writeln!(out, "✅ {}", report.summary());
            Self::render_warnings(&mut out, report);
            return out;
        }

        let verdict = if report.is_success() { "✅ PASSED" } else { "❌ FAILED" };
        let _ = writeln!(out, "📊 Comparison result: {}", verdict);
        let _ = writeln!(
            out,
            "├─ Rows: {} compared, {} passed, {} failed",
            report.total_rows,
            report.passed_rows,
            report.failed_rows()
        );
        let _ = writeln!(out, "├─ Time: {:.3} sec.", report.elapsed_seconds);

        for (i, bucket) in report.buckets.iter().enumerate() {
            let last = i == report.buckets.len() - 1;
            let (branch, indent) = if last { ("└─", "   ") } else { ("├─", "│  ") };
            let icon = if bucket.result_type == RowComparisonResultType::Passed || bucket.rows.is_empty() {
                "✅"
            } else {
                "❌"
            };
            let _ = writeln!(out, "{} {} {}: {}", branch, icon, bucket.name, bucket.rows.len());

            let list_rows = bucket.result_type != RowComparisonResultType::Passed || show_passed;
            if list_rows {
                Self::render_rows(&mut out, &bucket.rows, indent);
            }
        }
        Self::render_warnings(&mut out, report);
        out
    }

    fn render_rows(out: &mut String, rows: &[RowReport], indent: &str) {
        let shown = rows.len().min(MAX_ROWS_PER_BUCKET);
        for (i, row) in rows.iter().take(shown).enumerate() {
            let last = i == shown - 1 && rows.len() <= shown;
            let (branch, inner) = if last { ("└─", "   ") } else { ("├─", "│  ") };
            let _ = writeln!(out, "{}{} {}", indent, branch, row.label);

            let lines = Self::row_lines(row);
            for (j, line) in lines.iter().enumerate() {
                let marker = if j == lines.len() - 1 { "└─" } else { "├─" };
                let _ = writeln!(out, "{}{}{} {}", indent, inner, marker, line);
            }
        }
        if rows.len() > shown {
            let _ = writeln!(out, "{}└─ ... and {} more", indent, rows.len() - shown);
        }
    }

    fn row_lines(row: &RowReport) -> Vec<String> {
        let comparison = &row.comparison;
        match comparison.result_type {
            RowComparisonResultType::NotFound | RowComparisonResultType::Extra => {
                let values = comparison
                    .details
                    .iter()
                    .map(|d| {
                        let value = d.expected.as_deref().or(d.actual.as_deref()).unwrap_or("null");
                        format!("{}={}", d.column, value)
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![values]
            }
            _ => {
                let mut lines = comparison.mismatches();
                if lines.is_empty() && row.duplicate_of.is_some() {
                    lines.push("identical to the earlier row".to_string());
                }
                lines
            }
        }
    }

    fn render_warnings(out: &mut String, report: &ComparisonReport) {
        if report.warnings.is_empty() {
            return;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "🟡 Warnings:");
        for warning in &report.warnings {
            let _ = writeln!(out, "  {}", warning);
        }
    }

    /// Print the columns of a source
    pub fn print_header(description: &str, header: &Header) {
        println!("📋 {}", description);
        if header.is_empty() {
            println!("└─ (no columns)");
            return;
        }
        for (i, (name, column_type)) in header.columns().enumerate() {
            let prefix = if i == header.len() - 1 { "└─" } else { "├─" };
            println!("{} {}: {}", prefix, name, column_type);
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Format a comparison report, with its summary and verdict on top
    pub fn format_report(report: &ComparisonReport) -> Result<String> {
        let json = json!({
            "success": report.is_success(),
            "summary": report.summary(),
            "report": report,
        });
        Self::format(&json)
    }

    /// Format a source header as an ordered list of columns
    pub fn format_header(header: &Header) -> Result<String> {
        let columns: Vec<_> = header
            .columns()
            .map(|(name, column_type)| json!({ "name": name, "type": column_type }))
            .collect();
        Self::format(&json!({ "columns": columns }))
    }

    /// Write a comparison report to a file
    pub fn write_report(path: &Path, report: &ComparisonReport) -> Result<()> {
        fs::write(path, Self::format_report(report)?)?;
        Ok(())
    }
}
