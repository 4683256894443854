//! Integration tests for delimited file comparisons

use crate::common::{compare_csv, params, run_params, sample_data, verdict_types, CliTestRunner, TestFixture};
use std::fs;
use tabcompare::config::{CSV_DELIMITER, KEY_COLUMNS};
use tabcompare::numeric::NUMERIC_COLUMNS;
use tabcompare::RowComparisonResultType::{self, *};

#[test]
fn test_identical_files_pass() {
    let fixture = TestFixture::new().unwrap();
    let report = compare_csv(&fixture, &sample_data::trades(), &sample_data::trades(), &[]).unwrap();

    assert!(report.is_success());
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.passed_rows, 3);
    assert_eq!(
        report.summary(),
        "Compared 3 rows: 3 passed, 0 failed, 0 not found, 0 extra"
    );
}

#[test]
fn test_positional_comparison_without_keys() {
    let fixture = TestFixture::new().unwrap();
    let report = compare_csv(&fixture, &sample_data::trades(), &sample_data::trades_changed(), &[]).unwrap();

    // Rows are paired by position: all three differ
    assert_eq!(verdict_types(&report), vec![Failed, Failed, Failed]);
    assert_eq!(report.passed_rows, 0);
}

#[test]
fn test_keyed_comparison_fills_every_bucket() {
    let fixture = TestFixture::new().unwrap();
    let report = compare_csv(
        &fixture,
        &sample_data::trades(),
        &sample_data::trades_changed(),
        &[(KEY_COLUMNS, "id")],
    )
    .unwrap();

    assert_eq!(verdict_types(&report), vec![Passed, Extra, Failed, NotFound]);
    for result_type in RowComparisonResultType::ALL {
        assert_eq!(report.count(result_type), 1, "{} bucket", result_type);
    }

    let failed = &report.bucket(Failed)[0];
    assert_eq!(failed.label, "Row #3");
    let mismatches = failed.comparison.mismatches();
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].contains("amount"));
}

#[test]
fn test_numeric_scale_absorbs_small_differences() {
    let fixture = TestFixture::new().unwrap();
    let tolerant = compare_csv(
        &fixture,
        &sample_data::trades(),
        &sample_data::trades_changed(),
        &[(KEY_COLUMNS, "id"), (NUMERIC_COLUMNS, "amount:0")],
    )
    .unwrap();
    assert_eq!(tolerant.count(Failed), 0);
    assert_eq!(tolerant.count(Passed), 2);

    let strict = compare_csv(
        &fixture,
        &sample_data::trades(),
        &sample_data::trades_changed(),
        &[(KEY_COLUMNS, "id"), (NUMERIC_COLUMNS, "amount:2")],
    )
    .unwrap();
    assert_eq!(strict.count(Failed), 1);
}

#[test]
fn test_composite_key() {
    let fixture = TestFixture::new().unwrap();
    let expected = vec![
        vec!["region", "id", "total"],
        vec!["eu", "1", "10"],
        vec!["us", "1", "20"],
    ];
    let actual = vec![
        vec!["region", "id", "total"],
        vec!["us", "1", "20"],
        vec!["eu", "1", "10"],
    ];
    let report = compare_csv(&fixture, &expected, &actual, &[(KEY_COLUMNS, "region,id")]).unwrap();
    assert!(report.is_success());
    assert_eq!(report.total_rows, 2);
}

#[test]
fn test_per_side_delimiters() {
    let fixture = TestFixture::new().unwrap();
    let expected = fixture
        .create_csv_with_delimiter("expected.tsv", &sample_data::trades(), '\t')
        .unwrap();
    let actual = fixture
        .create_csv_with_delimiter("actual.psv", &sample_data::trades(), '|')
        .unwrap();

    let mut raw = params(
        "CsvFile",
        &expected.to_string_lossy(),
        "CsvFile",
        &actual.to_string_lossy(),
    );
    raw.insert(CSV_DELIMITER.expected.into(), "\\t".into());
    raw.insert(CSV_DELIMITER.actual.into(), "|".into());

    let report = run_params(&raw).unwrap();
    assert!(report.is_success());
    assert_eq!(report.total_rows, 3);
}

#[test]
fn test_cli_compare_writes_json_report() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let expected = fixture.create_csv("expected.csv", &sample_data::trades()).unwrap();
    let actual = fixture.create_csv("actual.csv", &sample_data::trades_changed()).unwrap();
    let report_path = fixture.path_str("report.json");

    runner.expect_mismatch(&[
        "compare",
        "--expected-format",
        "CsvFile",
        "--expected",
        &expected.to_string_lossy(),
        "--actual-format",
        "CsvFile",
        "--actual",
        &actual.to_string_lossy(),
        "--key-columns",
        "id",
        "--format",
        "json",
        "--output",
        &report_path,
    ]);

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written["success"], false);
    assert_eq!(written["report"]["total_rows"], 4);
    assert_eq!(written["report"]["passed_rows"], 1);
    assert_eq!(written["report"]["buckets"][3]["name"], "Extra rows");
}

#[test]
fn test_cli_compare_from_params_file() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let expected = fixture.create_csv("expected.csv", &sample_data::trades()).unwrap();
    let actual = fixture.create_csv("actual.csv", &sample_data::trades()).unwrap();
    let params_file = fixture
        .create_params(
            "params.json",
            &serde_json::json!({
                "ExpectedFormat": "CsvFile",
                "ExpectedSource": expected.to_string_lossy(),
                "ActualFormat": "CsvFile",
                "ActualSource": "overridden below",
                "KeyColumns": "id"
            }),
        )
        .unwrap();

    runner.expect_success(&[
        "compare",
        "--params",
        &params_file.to_string_lossy(),
        "--actual",
        &actual.to_string_lossy(),
    ]);
}

#[test]
fn test_cli_reports_invalid_output_format() {
    let runner = CliTestRunner::new().unwrap();
    let err = runner.expect_failure(&[
        "compare",
        "--expected-format",
        "CsvFile",
        "--expected",
        "e.csv",
        "--actual-format",
        "CsvFile",
        "--actual",
        "a.csv",
        "--format",
        "xml",
    ]);
    assert!(err.to_string().contains("Invalid output format"));
}
