//! Synthetic loan applications and transaction histories.
//!
//! Used to exercise the pipeline end to end without real customer data.
//! Same seed + same config always yields the same dataset.
//!
//! A fraction of addresses is deliberately irregular (no postal code,
//! missing street line, single segment) so the address heuristic sees the
//! shapes it meets in production.

use crate::{
    record::{LoanApplication, Transaction},
    rng::{DataRng, Stream},
};
use chrono::{Duration, NaiveDate};

// ── Reference pools ──────────────────────────────────────────────────────────

const REGIONS: &[(&str, &str, &str)] = &[
    ("Pune", "Maharashtra", "411"),
    ("Mumbai", "Maharashtra", "400"),
    ("Bengaluru", "Karnataka", "560"),
    ("Chennai", "Tamil Nadu", "600"),
    ("Jaipur", "Rajasthan", "302"),
    ("Lucknow", "Uttar Pradesh", "226"),
    ("Kolkata", "West Bengal", "700"),
    ("Hyderabad", "Telangana", "500"),
];

const STREETS: &[&str] = &["Main St", "MG Road", "Station Road", "Park Lane", "Lake View"];

const LOAN_TYPES: &[&str] = &["Personal Loan", "Home Loan", "Auto Loan"];

const PURPOSES: &[&str] = &[
    "Medical Emergency",
    "Education",
    "Debt Consolidation",
    "Business Expansion",
    "Wedding",
    "Vehicle Purchase",
    "Home Renovation",
];

const EMPLOYMENT: &[&str] = &["Salaried", "Self-Employed"];
const PROPERTY: &[&str] = &["Owned", "Rented", "Mortgaged"];
const GENDERS: &[&str] = &["Male", "Female", "Other"];

const MERCHANT_CATEGORIES: &[&str] = &[
    "Groceries",
    "Utilities",
    "Electronics",
    "Travel",
    "Dining",
    "Fuel",
    "Healthcare",
    "Online Shopping",
    "Gambling",
    "Cash Withdrawal",
];

/// Generator knobs.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub customers: usize,
    /// Each customer files 1..=max applications.
    pub max_applications_per_customer: u64,
    pub mean_transactions_per_customer: f64,
    /// Applications fall in `[start, start + span_days)`.
    pub start: NaiveDate,
    pub span_days: i64,
    /// Transactions reach back this far before `start`.
    pub history_days: i64,
    pub fraud_rate: f64,
    pub reversal_rate: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            customers: 200,
            max_applications_per_customer: 2,
            mean_transactions_per_customer: 60.0,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            span_days: 365,
            history_days: 400,
            fraud_rate: 0.05,
            reversal_rate: 0.03,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticDataset {
    pub applications: Vec<LoanApplication>,
    pub transactions: Vec<Transaction>,
}

pub fn generate(seed: u64, config: &SyntheticConfig) -> SyntheticDataset {
    let mut app_rng = DataRng::new(seed, Stream::Applications);
    let mut txn_rng = DataRng::new(seed, Stream::Transactions);

    let mut dataset = SyntheticDataset::default();
    let mut next_application = 0usize;

    for c in 0..config.customers {
        let customer_id = format!("C{c:05}");
        let profile = CustomerProfile::draw(&mut app_rng);

        let n_apps = 1 + app_rng.next_u64_below(config.max_applications_per_customer.max(1));
        for _ in 0..n_apps {
            let app = draw_application(
                &mut app_rng,
                config,
                &customer_id,
                format!("A{next_application:06}"),
                &profile,
            );
            next_application += 1;
            dataset.applications.push(app);
        }

        let n_txns = app_rng
            .normal(config.mean_transactions_per_customer, config.mean_transactions_per_customer / 3.0)
            .max(0.0)
            .round() as usize;
        for _ in 0..n_txns {
            dataset
                .transactions
                .push(draw_transaction(&mut txn_rng, config, &customer_id));
        }
    }

    log::info!(
        "synth: seed={seed} generated {} applications and {} transactions for {} customers",
        dataset.applications.len(),
        dataset.transactions.len(),
        config.customers
    );
    dataset
}

/// Stable per-customer attributes shared by all their applications.
struct CustomerProfile {
    monthly_income: f64,
    age: f64,
    gender: &'static str,
    address: Option<String>,
}

impl CustomerProfile {
    fn draw(rng: &mut DataRng) -> Self {
        let monthly_income = (rng.pareto(20_000.0, 2.2).min(500_000.0) / 100.0).round() * 100.0;
        let age = rng.range_f64(21.0, 65.0).floor();
        Self {
            monthly_income,
            age,
            gender: *rng.pick(GENDERS),
            address: draw_address(rng),
        }
    }
}

fn draw_address(rng: &mut DataRng) -> Option<String> {
    let (city, state, prefix) = *rng.pick(REGIONS);
    let house = 1 + rng.next_u64_below(999);
    let street = rng.pick(STREETS);
    let zip = format!("{prefix}{:03}", rng.next_u64_below(1000));

    let roll = rng.next_f64();
    if roll < 0.02 {
        None
    } else if roll < 0.05 {
        Some(format!("Unit {house}"))
    } else if roll < 0.10 {
        // Street line missing: positions shift by one.
        Some(format!("{city}, {state}, {zip}"))
    } else if roll < 0.15 {
        Some(format!("{house} {street}, {city}, {state}"))
    } else {
        Some(format!("{house} {street}, {city}, {state}, {zip}"))
    }
}

fn draw_application(
    rng: &mut DataRng,
    config: &SyntheticConfig,
    customer_id: &str,
    application_id: String,
    profile: &CustomerProfile,
) -> LoanApplication {
    let fraud = rng.chance(config.fraud_rate);
    let day = rng.next_u64_below(config.span_days.max(1) as u64) as i64;
    let date = config.start + Duration::days(day);

    let income = profile.monthly_income;
    let loan_multiple = if fraud { rng.range_f64(3.0, 12.0) } else { rng.range_f64(0.3, 4.0) };
    let loan_amount = (income * loan_multiple / 1000.0).round() * 1000.0;
    let emis = (income * rng.range_f64(0.0, 0.5) / 100.0).round() * 100.0;
    let cibil_raw = if fraud { rng.normal(580.0, 80.0) } else { rng.normal(720.0, 60.0) };
    let cibil = cibil_raw.clamp(300.0, 900.0).round();

    // A small share of dates arrive malformed.
    let application_date = if rng.chance(0.01) {
        format!("{}th of {}", date.format("%d"), date.format("%B"))
    } else {
        date.format("%Y-%m-%d").to_string()
    };

    LoanApplication {
        application_id,
        customer_id: customer_id.to_string(),
        application_date,
        loan_type: Some(rng.pick(LOAN_TYPES).to_string()),
        loan_amount_requested: loan_amount,
        loan_tenure_months: Some((12 * (1 + rng.next_u64_below(10))) as f64),
        interest_rate_offered: Some((rng.range_f64(8.0, 20.0) * 10.0).round() / 10.0),
        purpose_of_loan: Some(rng.pick(PURPOSES).to_string()),
        employment_status: Some(rng.pick(EMPLOYMENT).to_string()),
        monthly_income: income,
        cibil_score: cibil,
        existing_emis_monthly: emis,
        debt_to_income_ratio: ((emis / (income + 1.0)) * 10_000.0).round() / 100.0,
        property_ownership_status: Some(rng.pick(PROPERTY).to_string()),
        residential_address: profile.address.clone(),
        applicant_age: profile.age,
        gender: Some(profile.gender.to_string()),
        number_of_dependents: Some(rng.next_u64_below(5) as f64),
        loan_status: Some(if fraud { "Declined" } else { "Approved" }.to_string()),
        fraud_flag: Some(i64::from(fraud)),
        fraud_type: fraud.then(|| "Synthetic Identity".to_string()),
    }
}

fn draw_transaction(rng: &mut DataRng, config: &SyntheticConfig, customer_id: &str) -> Transaction {
    let span = (config.history_days + config.span_days).max(1) as u64;
    let offset = rng.next_u64_below(span) as i64 - config.history_days;
    let date = config.start + Duration::days(offset);
    let seconds = rng.next_u64_below(86_400) as i64;
    let timestamp = date.and_hms_opt(0, 0, 0).unwrap_or_default() + Duration::seconds(seconds);

    let mut amount = (rng.pareto(50.0, 1.3).min(200_000.0) * 100.0).round() / 100.0;
    if rng.chance(config.reversal_rate) {
        amount = -amount;
    }

    Transaction {
        customer_id: customer_id.to_string(),
        transaction_date: timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        transaction_amount: Some(amount),
        merchant_category: Some(rng.pick(MERCHANT_CATEGORIES).to_string()),
    }
}
