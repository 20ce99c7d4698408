//! Feature assembly: one engineered row per application.
//!
//! Row layout: the application's own fields, then the derived date,
//! ratio and location fields, then the aggregate columns. Aggregates are
//! left-joined on application_id; an application without an aggregate
//! row keeps its row with the aggregate cells missing.

use crate::{
    address::Location,
    aggregation::{column_names, AggregatedFeatureRow, TransactionAggregator},
    config::PipelineConfig,
    date_features::DateFeatures,
    error::ScoreResult,
    ratio_features::IncomeRatios,
    record::{LoanApplication, Transaction},
    schema::ExpectedSchema,
    table::{FeatureTable, FeatureValue},
    types::WindowDays,
};
use std::collections::HashMap;

/// The application's own columns plus the row-wise derived ones.
pub fn application_columns(app: &LoanApplication) -> Vec<(String, FeatureValue)> {
    let dates = DateFeatures::from_raw(&app.application_date);
    let ratios = IncomeRatios::compute(
        app.existing_emis_monthly,
        app.loan_amount_requested,
        app.monthly_income,
    );
    let location = Location::parse(app.residential_address.as_deref());

    let cols: Vec<(&str, FeatureValue)> = vec![
        ("application_id", app.application_id.as_str().into()),
        ("customer_id", app.customer_id.as_str().into()),
        ("application_date", app.application_date.as_str().into()),
        ("loan_type", app.loan_type.clone().into()),
        ("loan_amount_requested", app.loan_amount_requested.into()),
        ("loan_tenure_months", app.loan_tenure_months.into()),
        ("interest_rate_offered", app.interest_rate_offered.into()),
        ("purpose_of_loan", app.purpose_of_loan.clone().into()),
        ("employment_status", app.employment_status.clone().into()),
        ("monthly_income", app.monthly_income.into()),
        ("cibil_score", app.cibil_score.into()),
        ("existing_emis_monthly", app.existing_emis_monthly.into()),
        ("debt_to_income_ratio", app.debt_to_income_ratio.into()),
        ("property_ownership_status", app.property_ownership_status.clone().into()),
        ("residential_address", app.residential_address.clone().into()),
        ("applicant_age", app.applicant_age.into()),
        ("gender", app.gender.clone().into()),
        ("number_of_dependents", app.number_of_dependents.into()),
        ("loan_status", app.loan_status.clone().into()),
        ("fraud_flag", app.fraud_flag.map(|f| f as f64).into()),
        ("fraud_type", app.fraud_type.clone().into()),
        ("application_year", dates.application_year.map(f64::from).into()),
        ("application_month", dates.application_month.map(f64::from).into()),
        ("application_day_of_week", dates.application_day_of_week.map(f64::from).into()),
        ("existing_emi_to_income_ratio", ratios.existing_emi_to_income_ratio.into()),
        ("loan_amount_to_income_ratio", ratios.loan_amount_to_income_ratio.into()),
        ("city", location.city.into()),
        ("state", location.state.into()),
        ("zip_code", location.zip_code.into()),
    ];

    cols.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Append aggregate columns, or missing cells when `agg` is `None`.
fn append_aggregates(
    row: &mut Vec<(String, FeatureValue)>,
    agg: Option<&AggregatedFeatureRow>,
    windows: &[WindowDays],
) {
    match agg {
        Some(agg) => row.extend(agg.named_values()),
        None => row.extend(column_names(windows).into_iter().map(|c| (c, FeatureValue::Missing))),
    }
}

/// Join engineered application rows with their aggregates.
pub fn assemble(
    applications: &[LoanApplication],
    aggregates: &[AggregatedFeatureRow],
    windows: &[WindowDays],
) -> ScoreResult<FeatureTable> {
    let by_id: HashMap<&str, &AggregatedFeatureRow> = aggregates
        .iter()
        .map(|a| (a.application_id.as_str(), a))
        .collect();

    let rows = applications
        .iter()
        .map(|app| {
            let mut row = application_columns(app);
            let agg = by_id.get(app.application_id.as_str()).copied();
            if agg.is_none() {
                log::warn!(
                    "assembly: no aggregate row for application {}",
                    app.application_id
                );
            }
            append_aggregates(&mut row, agg, windows);
            row
        })
        .collect();

    FeatureTable::from_named_rows(rows)
}

/// The full feature-engineering pipeline, from raw records to the
/// model's reconciled input.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    aggregator: TransactionAggregator,
    drop_columns: Vec<String>,
}

impl FeaturePipeline {
    pub fn new(config: &PipelineConfig) -> ScoreResult<Self> {
        config.validate()?;
        Ok(Self {
            aggregator: TransactionAggregator::new(config.windows.clone())?
                .with_parallel(config.parallel),
            drop_columns: config.drop_columns.clone(),
        })
    }

    /// Every engineered column, identifiers and labels included.
    pub fn engineer(
        &self,
        applications: &[LoanApplication],
        transactions: &[Transaction],
    ) -> ScoreResult<FeatureTable> {
        let aggregates = self.aggregator.aggregate_records(applications, transactions);
        assemble(applications, &aggregates, self.aggregator.windows())
    }

    /// Engineered columns minus identifiers and labels.
    pub fn model_inputs(
        &self,
        applications: &[LoanApplication],
        transactions: &[Transaction],
    ) -> ScoreResult<FeatureTable> {
        let mut table = self.engineer(applications, transactions)?;
        table.drop_columns(&self.drop_columns);
        Ok(table)
    }

    /// Model inputs projected onto `schema`.
    pub fn reconciled(
        &self,
        applications: &[LoanApplication],
        transactions: &[Transaction],
        schema: &ExpectedSchema,
    ) -> ScoreResult<FeatureTable> {
        let table = self.model_inputs(applications, transactions)?;
        schema.reconcile(&table)
    }
}
