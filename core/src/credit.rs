//! Creditworthiness score: an explicit banded sum, not a model.
//!
//! Only meaningful for applications the fraud model did not flag.

use crate::{ratio_features::income_ratio_pct, record::LoanApplication};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Constants ────────────────────────────────────────────────────────────────

const CIBIL_FLOOR: f64 = 300.0;
const CIBIL_UNITS_PER_POINT: f64 = 6.0;
const CIBIL_MAX_POINTS: f64 = 40.0;
const AGE_THRESHOLD: f64 = 30.0;
const AGE_POINTS: f64 = 5.0;

/// (minimum monthly income, points), highest tier first.
const INCOME_TIERS: [(f64, f64); 3] = [(100_000.0, 20.0), (50_000.0, 15.0), (30_000.0, 10.0)];
const INCOME_FLOOR_POINTS: f64 = 5.0;

/// (exclusive upper bound, points), lowest band first.
const DTI_BANDS: [(f64, f64); 2] = [(20.0, 15.0), (35.0, 10.0)];
const DTI_FLOOR_POINTS: f64 = 5.0;
const EMI_RATIO_BANDS: [(f64, f64); 2] = [(20.0, 10.0), (40.0, 5.0)];
const LOAN_RATIO_BANDS: [(f64, f64); 2] = [(100.0, 10.0), (200.0, 5.0)];

/// Inputs to the score. Built from an application or supplied directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditInputs {
    pub cibil_score: f64,
    pub monthly_income: f64,
    pub debt_to_income_ratio: f64,
    pub existing_emis_monthly: f64,
    pub loan_amount_requested: f64,
    pub applicant_age: f64,
}

impl From<&LoanApplication> for CreditInputs {
    fn from(app: &LoanApplication) -> Self {
        Self {
            cibil_score: app.cibil_score,
            monthly_income: app.monthly_income,
            debt_to_income_ratio: app.debt_to_income_ratio,
            existing_emis_monthly: app.existing_emis_monthly,
            loan_amount_requested: app.loan_amount_requested,
            applicant_age: app.applicant_age,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditLabel {
    Excellent,
    Good,
    Average,
    Poor,
}

impl CreditLabel {
    /// Bands include their lower bound: 80.0 is Excellent.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            CreditLabel::Excellent
        } else if score >= 60.0 {
            CreditLabel::Good
        } else if score >= 40.0 {
            CreditLabel::Average
        } else {
            CreditLabel::Poor
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Excellent" => Some(CreditLabel::Excellent),
            "Good" => Some(CreditLabel::Good),
            "Average" => Some(CreditLabel::Average),
            "Poor" => Some(CreditLabel::Poor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CreditLabel::Excellent => "Excellent",
            CreditLabel::Good => "Good",
            CreditLabel::Average => "Average",
            CreditLabel::Poor => "Poor",
        }
    }
}

impl fmt::Display for CreditLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditAssessment {
    pub score: f64,
    pub label: CreditLabel,
}

fn banded(value: f64, bands: &[(f64, f64)], floor: f64) -> f64 {
    bands
        .iter()
        .find(|(upper, _)| value < *upper)
        .map_or(floor, |(_, points)| *points)
}

/// Score in [0, 100], rounded to one decimal.
pub fn creditworthiness_score(inputs: &CreditInputs) -> f64 {
    let mut score = ((inputs.cibil_score - CIBIL_FLOOR) / CIBIL_UNITS_PER_POINT)
        .clamp(0.0, CIBIL_MAX_POINTS);

    score += INCOME_TIERS
        .iter()
        .find(|(min, _)| inputs.monthly_income >= *min)
        .map_or(INCOME_FLOOR_POINTS, |(_, points)| *points);

    score += banded(inputs.debt_to_income_ratio, &DTI_BANDS, DTI_FLOOR_POINTS);

    let emi_ratio = income_ratio_pct(inputs.existing_emis_monthly, inputs.monthly_income);
    score += banded(emi_ratio, &EMI_RATIO_BANDS, 0.0);

    let loan_ratio = income_ratio_pct(inputs.loan_amount_requested, inputs.monthly_income);
    score += banded(loan_ratio, &LOAN_RATIO_BANDS, 0.0);

    if inputs.applicant_age >= AGE_THRESHOLD {
        score += AGE_POINTS;
    }

    (score * 10.0).round() / 10.0
}

pub fn assess(inputs: &CreditInputs) -> CreditAssessment {
    let score = creditworthiness_score(inputs);
    CreditAssessment {
        score,
        label: CreditLabel::from_score(score),
    }
}
