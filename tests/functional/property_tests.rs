//! Properties that must hold across families of inputs

use crate::common::{compare_csv, verdict_types, TestFixture};
use std::collections::BTreeMap;
use tabcompare::categorizer::ComparisonReport;
use tabcompare::config::KEY_COLUMNS;
use tabcompare::numeric::NUMERIC_COLUMNS;
use tabcompare::RowComparisonResultType::{self, *};

fn numbered_rows(count: usize, value: &str) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["id".to_string(), "val".to_string()]];
    rows.extend((1..=count).map(|i| vec![i.to_string(), value.to_string()]));
    rows
}

fn as_cells(rows: &[Vec<String>]) -> Vec<Vec<&str>> {
    rows.iter().map(|r| r.iter().map(String::as_str).collect()).collect()
}

/// Verdicts keyed by the `id` value of each row, independent of emission order
fn verdicts_by_key(report: &ComparisonReport) -> BTreeMap<String, Vec<RowComparisonResultType>> {
    let mut by_key: BTreeMap<String, Vec<RowComparisonResultType>> = BTreeMap::new();
    for bucket in &report.buckets {
        for row in &bucket.rows {
            let id = row
                .comparison
                .details
                .iter()
                .find(|d| d.column == "id")
                .and_then(|d| d.expected.clone().or_else(|| d.actual.clone()))
                .unwrap_or_default();
            by_key.entry(id).or_default().push(row.result_type);
        }
    }
    by_key
}

#[test]
fn test_ordered_comparison_covers_longer_side() {
    let fixture = TestFixture::new().unwrap();
    for expected_len in 0..=4 {
        for actual_len in 0..=4 {
            if expected_len == 0 && actual_len == 0 {
                continue;
            }
            let expected = numbered_rows(expected_len, "x");
            let actual = numbered_rows(actual_len, "x");
            let report = compare_csv(&fixture, &as_cells(&expected), &as_cells(&actual), &[]).unwrap();

            let longest = expected_len.max(actual_len);
            let shortest = expected_len.min(actual_len);
            assert_eq!(report.total_rows as usize, longest, "{} vs {}", expected_len, actual_len);

            let trailing = if expected_len > actual_len { NotFound } else { Extra };
            let types = verdict_types(&report);
            assert!(types[..shortest].iter().all(|t| *t == Passed));
            assert!(types[shortest..].iter().all(|t| *t == trailing));
        }
    }
}

#[test]
fn test_keyed_outcome_ignores_actual_order() {
    let fixture = TestFixture::new().unwrap();
    let expected = vec![
        vec!["id", "val"],
        vec!["1", "a"],
        vec!["2", "b"],
        vec!["3", "c"],
        vec!["4", "d"],
    ];
    let actual_rows = [vec!["1", "a"], vec!["2", "x"], vec!["5", "e"], vec!["4", "d"]];

    let orders: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [3, 2, 1, 0],
        [2, 0, 3, 1],
        [1, 3, 0, 2],
        [0, 2, 1, 3],
        [3, 0, 2, 1],
    ];

    let mut baseline = None;
    for order in orders {
        let mut actual = vec![vec!["id", "val"]];
        actual.extend(order.iter().map(|i| actual_rows[*i].clone()));
        let report = compare_csv(&fixture, &expected, &actual, &[(KEY_COLUMNS, "id")]).unwrap();

        let outcome = verdicts_by_key(&report);
        match &baseline {
            None => baseline = Some(outcome),
            Some(first) => assert_eq!(&outcome, first, "order {:?}", order),
        }
    }

    let baseline = baseline.unwrap();
    assert_eq!(baseline["1"], vec![Passed]);
    assert_eq!(baseline["2"], vec![Failed]);
    assert_eq!(baseline["3"], vec![NotFound]);
    assert_eq!(baseline["5"], vec![Extra]);
}

#[test]
fn test_higher_scale_never_passes_what_lower_scale_failed() {
    let fixture = TestFixture::new().unwrap();
    let pairs = [
        ("10.001", "10.00"),
        ("2.5", "3"),
        ("-1.005", "-1.01"),
        ("7.123456", "7.1235"),
        ("100", "100.0"),
    ];
    for (e, a) in pairs {
        let expected = vec![vec!["id", "amt"], vec!["1", e]];
        let actual = vec![vec!["id", "amt"], vec!["1", a]];
        let mut failed_at = None;
        for scale in 0..=6 {
            let spec = format!("amt:{}", scale);
            let report = compare_csv(
                &fixture,
                &expected,
                &actual,
                &[(KEY_COLUMNS, "id"), (NUMERIC_COLUMNS, spec.as_str())],
            )
            .unwrap();
            let passed = report.is_success();
            if let Some(failed) = failed_at {
                assert!(!passed, "{} vs {} failed at scale {} but passed at {}", e, a, failed, scale);
            } else if !passed {
                failed_at = Some(scale);
            }
        }
    }
}

#[test]
fn test_repeated_runs_classify_identically() {
    let fixture = TestFixture::new().unwrap();
    let expected = vec![
        vec!["id", "val"],
        vec!["1", "a"],
        vec!["2", "b"],
        vec!["2", "b"],
        vec!["3", "c"],
    ];
    let actual = vec![
        vec!["id", "val"],
        vec!["3", "c"],
        vec!["2", "B"],
        vec!["9", "z"],
        vec!["2", "b"],
    ];
    let extra = [(KEY_COLUMNS, "id"), ("CheckDuplicates", "true")];

    let first = compare_csv(&fixture, &expected, &actual, &extra).unwrap();
    let second = compare_csv(&fixture, &expected, &actual, &extra).unwrap();
    assert_eq!(first.verdicts(), second.verdicts());
    assert_eq!(first.summary(), second.summary());
}
