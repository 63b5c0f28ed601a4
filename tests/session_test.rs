mod common;

use analisador::loader::{load_path, LoadOptions};
use analisador::session::UnivariateAnalysis;
use analisador::{LoadCache, Session};

fn sample_session() -> (tempfile::NamedTempFile, Session) {
    let file = common::sample_csv();
    let df = load_path(file.path(), &LoadOptions::default()).unwrap();
    let session = Session::new("sample.csv", df);
    (file, session)
}

#[test]
fn test_overview_end_to_end() {
    let (_file, session) = sample_session();
    let overview = session.overview().unwrap();
    assert_eq!(overview.rows, 4);
    assert_eq!(overview.columns, 4);
    assert_eq!(overview.numeric_columns.len(), 2);
    assert_eq!(overview.datetime_columns, vec!["when".to_string()]);
    assert_eq!(overview.categorical_columns, vec!["label".to_string()]);
    assert_eq!(overview.info.columns.len(), 4);
    assert!(overview.info.estimated_bytes > 0);
}

#[test]
fn test_missing_report_end_to_end() {
    let (_file, session) = sample_session();
    let missing = session.missing();
    // 'partial' has two empty cells, 'when' one coercion failure
    assert_eq!(missing.total_nulls, 3);
    let partial = missing.columns.iter().find(|c| c.name == "partial").unwrap();
    assert_eq!(partial.count, 2);
    assert!((partial.pct - 50.0).abs() < 1e-9);
}

#[test]
fn test_univariate_each_kind() {
    let (_file, session) = sample_session();

    match session.univariate("amount", 10, 20).unwrap() {
        UnivariateAnalysis::Numeric { histogram, box_plot, .. } => {
            let total: usize = histogram.bins.iter().map(|b| b.count).sum();
            assert_eq!(total, 4);
            assert_eq!(box_plot.min, 10.5);
            assert_eq!(box_plot.max, 40.0);
        }
        other => panic!("expected numeric analysis, got {:?}", other),
    }

    match session.univariate("when", 10, 20).unwrap() {
        UnivariateAnalysis::Datetime { counts, .. } => {
            // three parsed dates, one null dropped
            assert_eq!(counts.iter().map(|(_, c)| c).sum::<usize>(), 3);
        }
        other => panic!("expected datetime analysis, got {:?}", other),
    }

    match session.univariate("label", 10, 20).unwrap() {
        UnivariateAnalysis::Categorical { counts, .. } => {
            assert_eq!(counts.total_categories, 3);
            assert_eq!(counts.entries[0], ("a".to_string(), 2));
            assert_eq!(counts.hidden, 0);
        }
        other => panic!("expected categorical analysis, got {:?}", other),
    }
}

#[test]
fn test_correlation_end_to_end() {
    let file = common::csv_file("x,y,z\n1,2,9\n2,4,7\n3,6,5\n4,8,3\n");
    let df = load_path(file.path(), &LoadOptions::default()).unwrap();
    let session = Session::new("xyz.csv", df);
    let matrix = session.correlation().unwrap();
    assert_eq!(matrix.columns, vec!["x", "y", "z"]);
    assert!(matrix.correlations[0][1] > 0.99);
    assert!(matrix.correlations[0][2] < -0.99);
}

#[test]
fn test_cache_get_or_load_round_trips_through_session() {
    let content = "a,b\n1,x\n2,y\n";
    let mut cache = LoadCache::new();
    let options = LoadOptions::default();

    let df1 = cache.get_or_load("data.csv", content.as_bytes(), &options).unwrap();
    let df2 = cache.get_or_load("data.csv", content.as_bytes(), &options).unwrap();
    assert_eq!(cache.len(), 1);
    assert!(df1.equals_missing(&df2));

    let session = Session::new("data.csv", df2);
    assert_eq!(session.overview().unwrap().rows, 2);
}
