//! Integration tests: row-wise features, assembly, and schema reconciliation.

use loanrisk_core::{
    address::Location,
    aggregation::column_names,
    assembly::{assemble, FeaturePipeline},
    config::{PipelineConfig, DEFAULT_DROP_COLUMNS},
    preprocess::split_labels,
    record::{LoanApplication, Transaction},
    schema::{ExpectedSchema, SchemaField},
    table::{FeatureTable, FeatureValue},
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn app(id: &str, date: &str, address: Option<&str>, income: f64) -> LoanApplication {
    LoanApplication {
        application_id: id.into(),
        customer_id: format!("C-{id}"),
        application_date: date.into(),
        loan_type: Some("Personal Loan".into()),
        loan_amount_requested: 50_000.0,
        loan_tenure_months: Some(24.0),
        interest_rate_offered: Some(11.5),
        purpose_of_loan: Some("Education".into()),
        employment_status: Some("Salaried".into()),
        monthly_income: income,
        cibil_score: 720.0,
        existing_emis_monthly: 10_000.0,
        debt_to_income_ratio: 14.28,
        property_ownership_status: Some("Rented".into()),
        residential_address: address.map(String::from),
        applicant_age: 34.0,
        gender: Some("Female".into()),
        number_of_dependents: Some(1.0),
        loan_status: Some("Approved".into()),
        fraud_flag: Some(0),
        fraud_type: None,
    }
}

fn history(customer: &str) -> Vec<Transaction> {
    vec![Transaction {
        customer_id: customer.into(),
        transaction_date: "2024-03-01 10:00:00".into(),
        transaction_amount: Some(250.0),
        merchant_category: Some("Groceries".into()),
    }]
}

// ── Address ──────────────────────────────────────────────────────────────────

#[test]
fn full_address_parses_positionally() {
    let loc = Location::parse(Some("123 Main St, Pune, Maharashtra, 411001"));
    assert_eq!(loc.city.as_deref(), Some("Pune"));
    assert_eq!(loc.state.as_deref(), Some("Maharashtra"));
    assert_eq!(loc.zip_code.as_deref(), Some("411001"));
}

#[test]
fn single_segment_address_has_no_location() {
    assert_eq!(Location::parse(Some("Unit 5")), Location::default());
    assert_eq!(Location::parse(None), Location::default());
}

/// Without a street line every position shifts; the heuristic keeps that.
#[test]
fn shifted_address_keeps_positional_reading() {
    let loc = Location::parse(Some("Pune, Maharashtra, 411001"));
    assert_eq!(loc.city.as_deref(), Some("Pune"));
    assert_eq!(loc.state.as_deref(), Some("Maharashtra"));

    let no_zip = Location::parse(Some("12 MG Road, Jaipur, Rajasthan"));
    assert_eq!(no_zip.city.as_deref(), Some("12 MG Road"));
    assert_eq!(no_zip.state.as_deref(), Some("Jaipur"));
    assert_eq!(no_zip.zip_code, None);
}

// ── Assembly ─────────────────────────────────────────────────────────────────

#[test]
fn engineered_row_carries_derived_columns() {
    init();
    let pipeline = FeaturePipeline::new(&PipelineConfig::default()).unwrap();
    let apps = vec![app("A1", "2024-03-18", Some("123 Main St, Pune, Maharashtra, 411001"), 70_000.0)];
    let table = pipeline.engineer(&apps, &history("C-A1")).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0, "application_year"), Some(&FeatureValue::Number(2024.0)));
    assert_eq!(table.get(0, "application_month"), Some(&FeatureValue::Number(3.0)));
    assert_eq!(table.get(0, "application_day_of_week"), Some(&FeatureValue::Number(0.0)));
    assert_eq!(table.get(0, "city"), Some(&FeatureValue::Text("Pune".into())));
    assert_eq!(table.get(0, "zip_code"), Some(&FeatureValue::Text("411001".into())));

    let emi = table.get(0, "existing_emi_to_income_ratio").and_then(FeatureValue::as_number).unwrap();
    assert!((emi - 14.2857).abs() < 1e-3, "emi ratio was {emi}");

    assert_eq!(table.get(0, "num_transactions_30d"), Some(&FeatureValue::Number(1.0)));
    assert_eq!(table.get(0, "total_transaction_amount_365d"), Some(&FeatureValue::Number(250.0)));
}

#[test]
fn malformed_date_and_zero_income_stay_usable() {
    init();
    let pipeline = FeaturePipeline::new(&PipelineConfig::default()).unwrap();
    let apps = vec![app("A1", "15th of March", None, 0.0)];
    let table = pipeline.engineer(&apps, &history("C-A1")).unwrap();

    for col in ["application_year", "application_month", "application_day_of_week", "city", "zip_code"] {
        assert!(table.get(0, col).unwrap().is_missing(), "{col} should be missing");
    }
    for col in ["existing_emi_to_income_ratio", "loan_amount_to_income_ratio"] {
        let v = table.get(0, col).and_then(FeatureValue::as_number).unwrap();
        assert!(v.is_finite(), "{col} must be finite, got {v}");
    }
    // No parseable date: the application has no prior history.
    assert_eq!(table.get(0, "num_transactions_365d"), Some(&FeatureValue::Number(0.0)));
}

#[test]
fn model_inputs_exclude_identifiers_and_labels() {
    init();
    let pipeline = FeaturePipeline::new(&PipelineConfig::default()).unwrap();
    let apps = vec![app("A1", "2024-03-18", None, 70_000.0)];
    let table = pipeline.model_inputs(&apps, &history("C-A1")).unwrap();

    for col in DEFAULT_DROP_COLUMNS {
        assert!(!table.has_column(col), "{col} should have been dropped");
    }
    assert!(table.has_column("cibil_score"));
    assert!(table.has_column("unique_merchant_categories_90d"));
}

#[test]
fn labels_split_off_before_training() {
    init();
    let pipeline = FeaturePipeline::new(&PipelineConfig::default()).unwrap();
    let mut flagged = app("A2", "2024-03-19", None, 70_000.0);
    flagged.fraud_flag = Some(1);
    flagged.loan_status = Some("Declined".into());
    let apps = vec![app("A1", "2024-03-18", None, 70_000.0), flagged];

    let table = pipeline.engineer(&apps, &[]).unwrap();
    let labeled = split_labels(table, &PipelineConfig::default().drop_columns);

    assert_eq!(labeled.fraud_flags, vec![Some(false), Some(true)]);
    assert_eq!(labeled.loan_status, vec![Some("Approved".into()), Some("Declined".into())]);
    assert!(!labeled.features.has_column("fraud_flag"));
    assert!(!labeled.features.has_column("application_id"));
    assert_eq!(labeled.features.len(), 2);
}

/// Applications without an aggregate row are kept with missing aggregates.
#[test]
fn assembly_is_a_left_join() {
    init();
    let apps = vec![app("A1", "2024-03-18", None, 70_000.0), app("A2", "2024-03-19", None, 70_000.0)];
    let table = assemble(&apps, &[], &[30]).unwrap();

    assert_eq!(table.len(), 2);
    for col in column_names(&[30]) {
        assert!(table.get(0, &col).unwrap().is_missing());
        assert!(table.get(1, &col).unwrap().is_missing());
    }
}

// ── Reconciliation ───────────────────────────────────────────────────────────

fn schema() -> ExpectedSchema {
    ExpectedSchema::new(vec![
        SchemaField { name: "cibil_score".into(), default: FeatureValue::Number(0.0) },
        SchemaField { name: "loan_type".into(), default: FeatureValue::Missing },
        SchemaField { name: "num_transactions_7d".into(), default: FeatureValue::Number(0.0) },
    ])
}

#[test]
fn reconcile_projects_onto_the_schema() {
    init();
    let pipeline = FeaturePipeline::new(&PipelineConfig::default()).unwrap();
    let apps = vec![app("A1", "2024-03-18", None, 70_000.0)];
    let table = pipeline.reconciled(&apps, &history("C-A1"), &schema()).unwrap();

    assert_eq!(table.columns(), schema().column_names().as_slice());
    assert_eq!(table.get(0, "cibil_score"), Some(&FeatureValue::Number(720.0)));
    assert_eq!(table.get(0, "loan_type"), Some(&FeatureValue::Text("Personal Loan".into())));
    // Not produced by a [30, 90, 180, 365] pipeline: zero-filled.
    assert_eq!(table.get(0, "num_transactions_7d"), Some(&FeatureValue::Number(0.0)));
}

#[test]
fn reconcile_is_idempotent() {
    init();
    let mut raw = FeatureTable::new(vec!["extra".into(), "cibil_score".into()]);
    raw.push_row(vec![FeatureValue::Text("x".into()), FeatureValue::Number(650.0)]).unwrap();
    raw.push_row(vec![FeatureValue::Missing, FeatureValue::Number(700.0)]).unwrap();

    let once = schema().reconcile(&raw).unwrap();
    let twice = schema().reconcile(&once).unwrap();
    assert_eq!(once, twice);
    assert!(!once.has_column("extra"));
    assert_eq!(once.len(), 2);
}
