//! Raw input records: loan applications and transaction history.
//!
//! Field names match the column headers of the input tables exactly,
//! so records deserialize straight from CSV rows.

use crate::types::{ApplicationId, CustomerId};
use serde::{Deserialize, Serialize};

/// One loan application as submitted.
///
/// `application_date` is kept as raw text; malformed values are coerced
/// to "no date" by the date extractor rather than rejected at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub application_id: ApplicationId,
    pub customer_id: CustomerId,
    pub application_date: String,
    #[serde(default)]
    pub loan_type: Option<String>,
    pub loan_amount_requested: f64,
    #[serde(default)]
    pub loan_tenure_months: Option<f64>,
    #[serde(default)]
    pub interest_rate_offered: Option<f64>,
    #[serde(default)]
    pub purpose_of_loan: Option<String>,
    #[serde(default)]
    pub employment_status: Option<String>,
    pub monthly_income: f64,
    pub cibil_score: f64,
    pub existing_emis_monthly: f64,
    pub debt_to_income_ratio: f64,
    #[serde(default)]
    pub property_ownership_status: Option<String>,
    #[serde(default)]
    pub residential_address: Option<String>,
    pub applicant_age: f64,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub number_of_dependents: Option<f64>,

    // ── Labels (present in training extracts only) ──────────────
    #[serde(default)]
    pub loan_status: Option<String>,
    #[serde(default)]
    pub fraud_flag: Option<i64>,
    #[serde(default)]
    pub fraud_type: Option<String>,
}

/// One financial transaction. Zero and negative amounts are reversals
/// and refunds; they are kept like any other row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub customer_id: CustomerId,
    pub transaction_date: String,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub merchant_category: Option<String>,
}
