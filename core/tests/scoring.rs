//! Integration tests: end-to-end scoring against a fitted bundle, and
//! persistence of the outcomes.

use loanrisk_core::{
    assembly::FeaturePipeline,
    config::PipelineConfig,
    error::ScoreError,
    model::{ColumnTransform, FraudClassifier, LogisticModel, ModelBundle, ModelContext},
    preprocess::ColumnTransformer,
    schema::ExpectedSchema,
    scoring::LoanScorer,
    store::ScoreStore,
    synth::{generate, SyntheticConfig, SyntheticDataset},
    table::FeatureValue,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn dataset(seed: u64) -> SyntheticDataset {
    generate(seed, &SyntheticConfig { customers: 40, ..SyntheticConfig::default() })
}

/// A bundle whose preprocessor is fitted on `data` and whose classifier
/// returns sigmoid(intercept) for every row.
fn constant_bundle(data: &SyntheticDataset, intercept: f64) -> ModelBundle {
    let pipeline = FeaturePipeline::new(&PipelineConfig::default()).unwrap();
    let inputs = pipeline.model_inputs(&data.applications, &data.transactions).unwrap();
    let preprocessor = ColumnTransformer::fit(&inputs).unwrap();
    let width = preprocessor.n_features_out();
    ModelBundle {
        classifier: LogisticModel::new(vec![0.0; width], intercept),
        feature_columns: preprocessor.feature_names_out(),
        preprocessor,
    }
}

#[test]
fn clean_applications_get_a_credit_score() {
    init();
    let data = dataset(21);
    let context = constant_bundle(&data, -4.0).into_context().unwrap();
    let scorer = LoanScorer::new(&context, &PipelineConfig::default()).unwrap();

    let outcomes = scorer.score(&data.applications, &data.transactions).unwrap();

    assert_eq!(outcomes.len(), data.applications.len());
    for (outcome, app) in outcomes.iter().zip(&data.applications) {
        assert_eq!(outcome.application_id, app.application_id, "outcomes keep input order");
        assert!(!outcome.fraud_flag);
        let credit = outcome.credit.expect("clean application carries a credit assessment");
        assert!((0.0..=100.0).contains(&credit.score), "score out of range: {}", credit.score);
    }
}

#[test]
fn flagged_applications_get_no_credit_score() {
    init();
    let data = dataset(22);
    let context = constant_bundle(&data, 4.0).into_context().unwrap();
    let scorer = LoanScorer::new(&context, &PipelineConfig::default()).unwrap();

    let outcomes = scorer.score(&data.applications, &data.transactions).unwrap();
    assert!(outcomes.iter().all(|o| o.fraud_flag && o.credit.is_none()));
    assert!(outcomes.iter().all(|o| o.fraud_probability > 0.98));
}

/// A batch the transform was not fitted on still scores: unseen
/// categories encode as all zeros and absent columns are zero-filled.
#[test]
fn unseen_batch_scores_against_fitted_schema() {
    init();
    let train = dataset(23);
    let context = constant_bundle(&train, -1.0).into_context().unwrap();

    let fresh = dataset(99);
    let config = PipelineConfig::default().with_windows(vec![30, 90]);
    let scorer = LoanScorer::new(&context, &config).unwrap();
    let outcomes = scorer.score(&fresh.applications, &fresh.transactions).unwrap();

    assert_eq!(outcomes.len(), fresh.applications.len());
}

/// A schema default other than zero is what absent columns receive.
#[test]
fn custom_schema_defaults_fill_absent_columns() {
    init();
    let data = dataset(29);
    let context = constant_bundle(&data, -1.0).into_context().unwrap();
    let fields = context
        .schema()
        .fields()
        .iter()
        .cloned()
        .map(|mut f| {
            if f.name == "num_transactions_365d" {
                f.default = FeatureValue::Number(12.0);
            }
            f
        })
        .collect();
    let context = context.with_schema(ExpectedSchema::new(fields));

    // No 365-day window: that column must come from the schema default.
    let config = PipelineConfig::default().with_windows(vec![30, 90]);
    let pipeline = FeaturePipeline::new(&config).unwrap();
    let table = pipeline
        .reconciled(&data.applications, &data.transactions, context.schema())
        .unwrap();
    let filled = table.column_values("num_transactions_365d").unwrap();
    assert!(filled.iter().all(|v| **v == FeatureValue::Number(12.0)));

    let outcomes = LoanScorer::new(&context, &config)
        .unwrap()
        .score(&data.applications, &data.transactions)
        .unwrap();
    let matrix = context.transform().transform(&table).unwrap();
    let flags = context.classifier().predict(&matrix).unwrap();
    let scored: Vec<bool> = outcomes.iter().map(|o| o.fraud_flag).collect();
    assert_eq!(flags, scored, "outcome flags follow the classifier threshold");
}

#[test]
fn empty_batch_scores_to_nothing() {
    init();
    let data = dataset(24);
    let context = constant_bundle(&data, 0.0).into_context().unwrap();
    let scorer = LoanScorer::new(&context, &PipelineConfig::default()).unwrap();
    assert!(scorer.score(&[], &data.transactions).unwrap().is_empty());
}

#[test]
fn bundle_width_must_match_classifier() {
    let data = dataset(25);
    let mut bundle = constant_bundle(&data, 0.0);
    bundle.classifier.coefficients.pop();
    assert!(matches!(
        bundle.into_context(),
        Err(ScoreError::FeatureWidthMismatch { .. })
    ));
}

#[test]
fn bundle_loads_from_json() {
    init();
    let data = dataset(26);
    let bundle = constant_bundle(&data, -2.0);
    let path = std::env::temp_dir().join(format!("bundle-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, serde_json::to_string(&bundle).unwrap()).unwrap();

    let context = ModelContext::load(path.to_str().unwrap()).unwrap();
    assert_eq!(context.transform().feature_names_in(), bundle.preprocessor.feature_names_in());
    assert_eq!(context.schema().len(), bundle.preprocessor.feature_names_in().len());
    assert_eq!(context.classifier().threshold(), 0.5);

    assert!(matches!(
        ModelContext::load("/no/such/bundle.json"),
        Err(ScoreError::InputNotFound { .. })
    ));
}

// ── Persistence ──────────────────────────────────────────────────────────────

#[test]
fn outcomes_persist_per_batch() {
    init();
    let data = dataset(27);
    let context = constant_bundle(&data, -4.0).into_context().unwrap();
    let scorer = LoanScorer::new(&context, &PipelineConfig::default()).unwrap();
    let outcomes = scorer.score(&data.applications, &data.transactions).unwrap();

    let mut store = ScoreStore::in_memory().unwrap();
    store.migrate().unwrap();
    let batch = store.begin_batch("synthetic", data.applications.len()).unwrap();
    store.record_outcomes(&batch, &outcomes).unwrap();

    assert_eq!(store.batch_count().unwrap(), 1);
    assert_eq!(store.outcome_count(&batch).unwrap(), outcomes.len() as i64);
    assert_eq!(store.flagged_count(&batch).unwrap(), 0);

    let read_back = store.outcomes_for_batch(&batch).unwrap();
    assert_eq!(read_back, outcomes);
}

#[test]
fn flagged_outcome_round_trips_without_credit() {
    let data = dataset(28);
    let context = constant_bundle(&data, 4.0).into_context().unwrap();
    let scorer = LoanScorer::new(&context, &PipelineConfig::default()).unwrap();
    let outcomes = scorer.score(&data.applications[..1], &data.transactions).unwrap();

    let store = ScoreStore::in_memory().unwrap();
    store.migrate().unwrap();
    let batch = store.begin_batch("single", 1).unwrap();
    store.insert_outcome(&batch, &outcomes[0]).unwrap();

    assert_eq!(store.flagged_count(&batch).unwrap(), 1);
    let read_back = store.outcomes_for_batch(&batch).unwrap();
    assert_eq!(read_back[0].credit, None);
    assert!(read_back[0].fraud_flag);
}
