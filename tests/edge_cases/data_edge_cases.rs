//! Edge case tests for unusual data shapes and invalid input

use crate::common::{compare_csv, params, run_params, verdict_types, TestFixture};
use tabcompare::categorizer::{ComparisonStatus, BOTH_EMPTY_MESSAGE};
use tabcompare::config::KEY_COLUMNS;
use tabcompare::numeric::NUMERIC_COLUMNS;
use tabcompare::RowComparisonResultType::*;
use tabcompare::{CompareError, Side};

#[test]
fn test_header_only_files_are_both_empty() {
    let fixture = TestFixture::new().unwrap();
    let header = vec![vec!["id", "val"]];
    let report = compare_csv(&fixture, &header, &header, &[(KEY_COLUMNS, "id")]).unwrap();

    assert_eq!(report.status, ComparisonStatus::BothEmpty);
    assert_eq!(report.summary(), BOTH_EMPTY_MESSAGE);
    assert!(report.is_success());
}

#[test]
fn test_completely_empty_files_are_both_empty() {
    let fixture = TestFixture::new().unwrap();
    let expected = fixture.create_file("expected.csv", "").unwrap();
    let actual = fixture.create_file("actual.csv", "").unwrap();
    let raw = params("CsvFile", &expected.to_string_lossy(), "CsvFile", &actual.to_string_lossy());

    let report = run_params(&raw).unwrap();
    assert_eq!(report.status, ComparisonStatus::BothEmpty);
}

#[test]
fn test_one_empty_side() {
    let fixture = TestFixture::new().unwrap();
    let expected = vec![vec!["id"], vec!["1"], vec!["2"]];
    let actual = vec![vec!["id"]];

    let report = compare_csv(&fixture, &expected, &actual, &[]).unwrap();
    assert_eq!(verdict_types(&report), vec![NotFound, NotFound]);

    let report = compare_csv(&fixture, &actual, &expected, &[(KEY_COLUMNS, "id")]).unwrap();
    assert_eq!(verdict_types(&report), vec![Extra, Extra]);
}

#[test]
fn test_quoted_fields_keep_delimiters_and_newlines() {
    let fixture = TestFixture::new().unwrap();
    let content = "id,note\n1,\"a, b\"\n2,\"line one\nline two\"\n";
    let expected = fixture.create_file("expected.csv", content).unwrap();
    let actual = fixture.create_file("actual.csv", content).unwrap();
    let raw = params("CsvFile", &expected.to_string_lossy(), "CsvFile", &actual.to_string_lossy());

    let report = run_params(&raw).unwrap();
    assert!(report.is_success());
    assert_eq!(report.total_rows, 2);
}

#[test]
fn test_short_row_differs_from_full_row() {
    let fixture = TestFixture::new().unwrap();
    let expected = fixture.create_file("expected.csv", "id,a,b\n1,x,y\n").unwrap();
    let actual = fixture.create_file("actual.csv", "id,a,b\n1,x\n").unwrap();
    let raw = params("CsvFile", &expected.to_string_lossy(), "CsvFile", &actual.to_string_lossy());

    let report = run_params(&raw).unwrap();
    assert_eq!(verdict_types(&report), vec![Failed]);
    let mismatches = report.bucket(Failed)[0].comparison.mismatches();
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].contains("'b'"));
}

#[test]
fn test_columns_present_on_one_side_only() {
    let fixture = TestFixture::new().unwrap();
    let expected = vec![vec!["id", "old"], vec!["1", "x"]];
    let actual = vec![vec!["id", "new"], vec!["1", "x"]];

    let report = compare_csv(&fixture, &expected, &actual, &[]).unwrap();
    let mismatches = report.bucket(Failed)[0].comparison.mismatches();
    assert_eq!(mismatches.len(), 2);
    assert!(mismatches.iter().any(|m| m.contains("missing in actual data")));
    assert!(mismatches.iter().any(|m| m.contains("missing in expected data")));
}

#[test]
fn test_missing_file_error_names_side() {
    let fixture = TestFixture::new().unwrap();
    let actual = fixture.create_csv("actual.csv", &[vec!["id"], vec!["1"]]).unwrap();
    let raw = params(
        "CsvFile",
        &fixture.path_str("nowhere.csv"),
        "CsvFile",
        &actual.to_string_lossy(),
    );

    let err = run_params(&raw).unwrap_err();
    assert_eq!(err.side(), Some(Side::Expected));
    assert!(err.to_string().starts_with("expected data"));
}

#[test]
fn test_unsupported_format_lists_acceptable_ones() {
    let raw = params("Parquet", "data.parquet", "CsvFile", "a.csv");
    match run_params(&raw) {
        Err(CompareError::UnsupportedFormat {
            parameter,
            format,
            acceptable,
        }) => {
            assert_eq!(parameter, "ExpectedFormat");
            assert_eq!(format, "Parquet");
            assert_eq!(acceptable, "'Query', 'QueryFile', 'CsvFile', 'Script', 'ScriptFile'");
        }
        other => panic!("expected unsupported format, got {:?}", other.map(|r| r.summary())),
    }
}

#[test]
fn test_bad_numeric_scale_fails_before_reading() {
    let fixture = TestFixture::new().unwrap();
    let data = vec![vec!["id", "amount"], vec!["1", "2.5"]];
    let err = compare_csv(&fixture, &data, &data, &[(NUMERIC_COLUMNS, "amount:-2")]).unwrap_err();
    assert!(matches!(err, CompareError::Config { .. }));
}

#[test]
fn test_missing_key_column_is_a_config_error() {
    let fixture = TestFixture::new().unwrap();
    let data = vec![vec!["id", "amount"], vec!["1", "2.5"]];
    let err = compare_csv(&fixture, &data, &data, &[(KEY_COLUMNS, "account")]).unwrap_err();
    assert!(err.to_string().contains("account"));
}

#[test]
fn test_unparsable_number_fails_only_its_row() {
    let fixture = TestFixture::new().unwrap();
    let expected = vec![vec!["id", "amount"], vec!["1", "n/a"], vec!["2", "3.50"]];
    let actual = vec![vec!["id", "amount"], vec!["1", "1.00"], vec!["2", "3.5"]];

    let report = compare_csv(&fixture, &expected, &actual, &[(NUMERIC_COLUMNS, "amount:2")]).unwrap();
    assert_eq!(verdict_types(&report), vec![Failed, Passed]);
    let mismatches = report.bucket(Failed)[0].comparison.mismatches();
    assert!(mismatches[0].contains("is not a valid number"));
}

#[test]
fn test_blank_key_values_still_match() {
    let fixture = TestFixture::new().unwrap();
    let expected = vec![vec!["id", "val"], vec!["", "a"], vec!["1", "b"]];
    let actual = vec![vec!["id", "val"], vec!["1", "b"], vec!["", "a"]];

    let report = compare_csv(&fixture, &expected, &actual, &[(KEY_COLUMNS, "id")]).unwrap();
    assert!(report.is_success());
}
