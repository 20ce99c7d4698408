//! Income-relative ratios.

/// Added to every income denominator so zero income stays finite.
/// Shared by the feature pipeline and the creditworthiness scorer.
pub const INCOME_EPSILON: f64 = 1e-6;

/// `numerator / (monthly_income + ε) * 100`.
pub fn income_ratio_pct(numerator: f64, monthly_income: f64) -> f64 {
    numerator / (monthly_income + INCOME_EPSILON) * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeRatios {
    pub existing_emi_to_income_ratio: f64,
    pub loan_amount_to_income_ratio: f64,
}

impl IncomeRatios {
    pub fn compute(existing_emis_monthly: f64, loan_amount_requested: f64, monthly_income: f64) -> Self {
        Self {
            existing_emi_to_income_ratio: income_ratio_pct(existing_emis_monthly, monthly_income),
            loan_amount_to_income_ratio: income_ratio_pct(loan_amount_requested, monthly_income),
        }
    }
}
