//! Integration tests: CSV boundary and configuration loading.

use loanrisk_core::{
    config::PipelineConfig,
    error::ScoreError,
    loader::{load_applications, load_transactions, read_csv, write_applications, write_feature_table},
    record::Transaction,
    synth::{generate, SyntheticConfig},
    table::{FeatureTable, FeatureValue},
};
use std::path::PathBuf;

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("loanrisk-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn missing_file_is_input_not_found() {
    let err = load_transactions("/definitely/not/here/transactions.csv").unwrap_err();
    assert!(
        matches!(err, ScoreError::InputNotFound { ref path } if path.ends_with("transactions.csv")),
        "unexpected error: {err}"
    );
}

/// A header with no rows cannot be scored against.
#[test]
fn header_only_file_is_empty_input() {
    let dir = scratch_dir();
    let path = dir.join("transactions.csv");
    std::fs::write(&path, "customer_id,transaction_date,transaction_amount,merchant_category\n").unwrap();

    let err = load_transactions(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, ScoreError::EmptyInput { .. }), "unexpected error: {err}");
}

#[test]
fn blank_optional_cells_read_as_none() {
    let csv = "customer_id, transaction_date ,transaction_amount,merchant_category\n\
               C1,2024-05-01 10:00:00,,\n\
               C1,2024-05-02,-12.5,Dining\n";
    let rows: Vec<Transaction> = read_csv(csv.as_bytes()).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].transaction_amount, None);
    assert_eq!(rows[0].merchant_category, None);
    assert_eq!(rows[1].transaction_amount, Some(-12.5));
    assert_eq!(rows[1].merchant_category.as_deref(), Some("Dining"));
}

#[test]
fn applications_survive_a_file_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = scratch_dir();
    let path = dir.join("loan_applications.csv");
    let data = generate(3, &SyntheticConfig { customers: 10, ..SyntheticConfig::default() });

    write_applications(path.to_str().unwrap(), &data.applications).unwrap();
    let loaded = load_applications(path.to_str().unwrap()).unwrap();

    assert_eq!(loaded.len(), data.applications.len());
    assert_eq!(loaded[0].application_id, data.applications[0].application_id);
    assert_eq!(loaded[0].residential_address, data.applications[0].residential_address);
}

#[test]
fn feature_table_writes_missing_as_blank() {
    let dir = scratch_dir();
    let path = dir.join("features.csv");
    let mut table = FeatureTable::new(vec!["a".into(), "b".into(), "c".into()]);
    table
        .push_row(vec![FeatureValue::Number(1.5), FeatureValue::Missing, FeatureValue::Text("x".into())])
        .unwrap();

    write_feature_table(path.to_str().unwrap(), &table).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "a,b,c\n1.5,,x\n");
}

#[test]
fn config_file_overrides_defaults() {
    let dir = scratch_dir();
    std::fs::write(dir.join("pipeline.json"), r#"{ "windows": [7, 30], "parallel": true }"#).unwrap();

    let config = PipelineConfig::load(dir.to_str().unwrap()).unwrap();
    assert_eq!(config.windows, vec![7, 30]);
    assert!(config.parallel);
    assert_eq!(config.drop_columns, PipelineConfig::default().drop_columns);
}

#[test]
fn config_rejects_bad_windows() {
    let dir = scratch_dir();
    std::fs::write(dir.join("pipeline.json"), r#"{ "windows": [30, 0] }"#).unwrap();
    assert!(PipelineConfig::load(dir.to_str().unwrap()).is_err());

    assert!(PipelineConfig::default().with_windows(vec![]).validate().is_err());
}
