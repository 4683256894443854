//! Unit tests for CLI argument parsing and validation

use clap::Parser;
use tabcompare::cli::{Cli, Commands, OutputFormat};
use tabcompare::commands::compare_settings;
use tabcompare::reader::SourceFormat;

#[test]
fn test_cli_compare_command_defaults() {
    let cli = Cli::try_parse_from([
        "tabcompare",
        "compare",
        "--expected-format",
        "CsvFile",
        "--expected",
        "e.csv",
        "--actual-format",
        "Query",
        "--actual",
        "SELECT 1",
    ])
    .unwrap();
    assert!(!cli.verbose);
    match cli.command {
        Commands::Compare(args) => {
            assert_eq!(args.expected.as_deref(), Some("e.csv"));
            assert_eq!(args.actual_format.as_deref(), Some("Query"));
            assert_eq!(args.format, "pretty");
            assert!(!args.check_duplicates);
            assert!(!args.show_passed);
            assert!(args.output.is_none());
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_describe_command() {
    let cli = Cli::try_parse_from([
        "tabcompare",
        "--verbose",
        "describe",
        "--format",
        "CsvFile",
        "--source",
        "data.csv",
        "--delimiter",
        "\\t",
    ])
    .unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Describe {
            format,
            source,
            delimiter,
            db,
            json,
        } => {
            assert_eq!(format, "CsvFile");
            assert_eq!(source, "data.csv");
            assert_eq!(delimiter.as_deref(), Some("\\t"));
            assert!(db.is_none());
            assert!(!json);
        }
        _ => panic!("Expected Describe command"),
    }
}

#[test]
fn test_cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["tabcompare"]).is_err());
    assert!(Cli::try_parse_from(["tabcompare", "diff"]).is_err());
}

#[test]
fn test_compare_flags_become_settings() {
    let cli = Cli::try_parse_from([
        "tabcompare",
        "compare",
        "--expected-format",
        "Script",
        "--expected",
        "cat e.csv",
        "--actual-format",
        "ScriptFile",
        "--actual",
        "./produce.sh",
        "--script-params",
        "--day 2024-01-31",
        "--shell",
        "sh",
        "--expected-delimiter",
        "|",
        "--key-columns",
        "id,day",
        "--numeric-columns",
        "amount:2",
        "--check-duplicates",
    ])
    .unwrap();
    let Commands::Compare(args) = cli.command else {
        panic!("Expected Compare command");
    };

    let settings = compare_settings(&args).unwrap();
    assert_eq!(settings.expected.format, SourceFormat::Script);
    assert_eq!(settings.expected.shell, "sh");
    assert_eq!(settings.expected.delimiter, b'|');
    assert_eq!(settings.actual.delimiter, b',');
    assert_eq!(settings.actual.script_params, "--day 2024-01-31");
    assert_eq!(settings.options.key_columns, vec!["id", "day"]);
    assert_eq!(settings.options.numeric_columns.scale("amount"), Some(2));
    assert!(settings.options.check_duplicates);
}

#[test]
fn test_output_format_parse() {
    assert!(matches!(OutputFormat::parse("pretty"), Ok(OutputFormat::Pretty)));
    assert!(matches!(OutputFormat::parse("Json"), Ok(OutputFormat::Json)));
    assert!(OutputFormat::parse("html").is_err());
}
