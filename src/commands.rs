//! Command implementations for tabcompare CLI

use crate::cli::{Commands, CompareArgs, OutputFormat};
use crate::compare::DataSetComparison;
use crate::config::{self, CompareSettings, RawParams, SourceSettings};
use crate::error::{CompareError, Result};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::reader::factory::DuckDbConnections;
use crate::reader::{open_reader, Side, SourceFormat};
use std::path::{Path, PathBuf};

/// Execute a command, returning whether it succeeded
pub fn execute_command(command: Commands) -> Result<bool> {
    match command {
        Commands::Compare(args) => compare_command(&args),
        Commands::Describe {
            format,
            source,
            delimiter,
            db,
            json,
        } => describe_command(&format, &source, delimiter.as_deref(), db.as_deref(), json),
    }
}

/// Resolve compare flags and an optional parameters file into settings
pub fn compare_settings(args: &CompareArgs) -> Result<CompareSettings> {
    let mut params = match &args.params {
        Some(path) => config::load_params_file(path)?,
        None => RawParams::new(),
    };
    args.apply_to(&mut params);
    CompareSettings::from_params(&params)
}

/// Compare two datasets and print the report
fn compare_command(args: &CompareArgs) -> Result<bool> {
    let format = OutputFormat::parse(&args.format)
        .map_err(|e| CompareError::config("format", e))?;
    let settings = compare_settings(args)?;
    log::debug!(
        "Comparing {} '{}' with {} '{}'",
        settings.expected.format,
        settings.expected.source,
        settings.actual.format,
        settings.actual.source
    );

    let mut progress = match format {
        OutputFormat::Pretty => ProgressReporter::new_for_compare(),
        OutputFormat::Json => ProgressReporter::new_minimal(),
    };
    let comparison = DataSetComparison::from_settings(&settings);
    let report = comparison.run_sources(&settings, &DuckDbConnections, &mut progress);
    progress.finish(&format!("Compared {} rows", progress.rows()));
    let report = report?;

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_report(&report, args.show_passed),
        OutputFormat::Json => println!("{}", JsonFormatter::format_report(&report)?),
    }
    if let Some(path) = &args.output {
        JsonFormatter::write_report(path, &report)?;
        log::info!("Report written to {}", path.display());
    }
    Ok(report.is_success())
}

/// Show the columns of one source
fn describe_command(
    format: &str,
    source: &str,
    delimiter: Option<&str>,
    db: Option<&Path>,
    json: bool,
) -> Result<bool> {
    let mut settings = SourceSettings::new(Side::Expected, SourceFormat::parse(format, "format")?, source);
    if let Some(delimiter) = delimiter {
        settings.delimiter = config::parse_delimiter(delimiter, "delimiter")?;
    }
    settings.database = db.map(PathBuf::from);

    let mut reader = open_reader(&settings, &DuckDbConnections)?;
    let header = reader.header()?;
    reader.close()?;
    if json {
        println!("{}", JsonFormatter::format_header(&header)?);
    } else {
        PrettyPrinter::print_header(&format!("{} {}", settings.format, source), &header);
    }
    Ok(true)
}
