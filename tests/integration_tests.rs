use goal_monitor::analyzers::analyzer::{Dataset, ReportOptions, load_dataset};
use goal_monitor::analyzers::polarity::KeywordPolarity;
use goal_monitor::analyzers::types::{PolarityBasis, Status};
use goal_monitor::source::{RawTable, Source};
use std::path::PathBuf;
use std::time::Duration;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/indicators.csv")
}

fn fixture() -> Dataset {
    let bytes = include_bytes!("fixtures/indicators.csv");
    let table = RawTable::from_csv_bytes(bytes).expect("Failed to parse fixture");
    Dataset::from_table(&table)
}

fn at(period: &str) -> ReportOptions {
    ReportOptions {
        reference_period: Some(period.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_normalization_counts() {
    let ds = fixture();

    assert_eq!(ds.stats.rows_in, 10);
    assert_eq!(ds.stats.dropped, 1);
    assert_eq!(ds.stats.kept, 9);
    assert_eq!(ds.stats.coerced_numeric, 1);
    assert_eq!(ds.records.len(), 9);
    assert!(ds.records.iter().all(|r| !r.owner.is_empty()));
}

#[test]
fn test_decimal_comma_and_default_category() {
    let ds = fixture();
    let satisfaction = ds
        .records
        .iter()
        .find(|r| r.indicator == "Satisfaction" && r.period == "2023.1")
        .unwrap();

    assert_eq!(satisfaction.actual, 85.5);
    assert_eq!(satisfaction.category, "General");
}

#[test]
fn test_full_pipeline_at_reference_period() {
    let ds = fixture();
    let report = ds.report(&at("2024.1"), &KeywordPolarity::default());

    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.met, 2);
    assert_eq!(report.summary.not_met, 2);

    let met: Vec<String> = report.met.iter().map(|l| l.key.to_string()).collect();
    let not_met: Vec<String> = report.not_met.iter().map(|l| l.key.to_string()).collect();
    let no_data: Vec<String> = report.no_data.iter().map(|k| k.to_string()).collect();

    assert_eq!(met, vec!["Unit A - Processing Time", "Unit D - Cases Judged"]);
    assert_eq!(not_met, vec!["Unit B - Productivity Index", "Unit D - Error Rate"]);
    assert_eq!(no_data, vec!["Unit C - Satisfaction"]);
}

#[test]
fn test_every_indicator_has_exactly_one_status() {
    let ds = fixture();
    for period in ds.periods() {
        let report = ds.report(&at(&period), &KeywordPolarity::default());
        let classified = report.met.len() + report.not_met.len() + report.no_data.len();
        assert_eq!(classified, report.series.len());

        for series in &report.series {
            let in_met = report.met.iter().any(|l| l.key == series.key);
            let in_not_met = report.not_met.iter().any(|l| l.key == series.key);
            let in_no_data = report.no_data.contains(&series.key);
            assert_eq!([in_met, in_not_met, in_no_data].iter().filter(|b| **b).count(), 1);
            match series.status {
                Status::Met => assert!(in_met),
                Status::NotMet => assert!(in_not_met),
                Status::NoData => assert!(in_no_data),
            }
        }
    }
}

#[test]
fn test_latest_period_uses_numeric_subperiod() {
    let ds = fixture();
    assert_eq!(ds.latest_period().as_deref(), Some("2024.10"));

    let report = ds.report(&ReportOptions::default(), &KeywordPolarity::default());
    let productivity = report
        .series
        .iter()
        .find(|s| s.key.indicator == "Productivity Index")
        .unwrap();
    let periods: Vec<&str> = productivity.points.iter().map(|p| p.period.as_str()).collect();

    assert_eq!(periods, vec!["2024.1", "2024.2", "2024.10"]);
    assert_eq!(productivity.status, Status::Met);
}

#[test]
fn test_numeric_hint_and_ambiguity_signals() {
    let ds = fixture();
    let evaluations = ds.evaluations(&at("2024.1"), true, &KeywordPolarity::default());

    let error_rate = evaluations
        .iter()
        .find(|e| e.record.indicator == "Error Rate")
        .unwrap();
    assert_eq!(error_rate.basis, PolarityBasis::NumericHint);
    assert!(!error_rate.met);

    let report = ds.report(&at("2024.1"), &KeywordPolarity::default());
    let ambiguous: Vec<String> = report
        .ambiguous_polarity
        .iter()
        .map(|k| k.to_string())
        .collect();
    assert_eq!(ambiguous, vec!["Unit B - Productivity Index", "Unit D - Cases Judged"]);
}

#[test]
fn test_category_filter_and_cascading_options() {
    let ds = fixture();
    let options = ReportOptions {
        categories: Some(vec!["Quality".to_string()]),
        ..at("2024.1")
    };

    let filter_options = ds.filter_options(&options);
    assert_eq!(filter_options.owners, vec!["Unit D"]);
    assert_eq!(filter_options.indicators, vec!["Cases Judged", "Error Rate"]);

    let report = ds.report(&options, &KeywordPolarity::default());
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.series.len(), 2);
}

#[tokio::test]
async fn test_load_dataset_from_file() {
    let ds = load_dataset(&Source::File(fixture_path()), Duration::from_secs(5))
        .await
        .expect("Failed to load fixture");
    assert_eq!(ds.records.len(), 9);
}
