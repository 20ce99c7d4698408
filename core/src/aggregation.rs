//! Transaction aggregation: per-application behavioural summaries.
//!
//! For every application, and every configured trailing window W, the
//! aggregator summarises the customer's transactions in
//! `[application_date - W days, application_date)`.
//!
//! RULES:
//!   - Point-in-time: a transaction dated at or after the application
//!     date never contributes to that application, for any window.
//!   - Completeness: every distinct application_id passed in produces
//!     exactly one output row, zero-valued when there is no history.
//!   - Output rows are ordered by application_id, in serial and
//!     parallel mode alike.
//!
//! Customers are independent partitions. Within a partition the
//! transactions are sorted once; each application finds its cutoff by
//! binary search and fills all windows in one backward sweep, smallest
//! window first, since windows are nested.

use crate::{
    config::validate_windows,
    date_features::parse_instant,
    error::ScoreResult,
    record::{LoanApplication, Transaction},
    table::FeatureValue,
    types::{ApplicationId, CustomerId, WindowDays},
};
use chrono::{Duration, NaiveDateTime};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

// ── Column naming ────────────────────────────────────────────────────────────

pub const METRIC_NUM_TRANSACTIONS: &str = "num_transactions";
pub const METRIC_TOTAL_AMOUNT: &str = "total_transaction_amount";
pub const METRIC_AVERAGE_AMOUNT: &str = "average_transaction_amount";
pub const METRIC_UNIQUE_MERCHANTS: &str = "unique_merchant_categories";

const METRICS: [&str; 4] = [
    METRIC_NUM_TRANSACTIONS,
    METRIC_TOTAL_AMOUNT,
    METRIC_AVERAGE_AMOUNT,
    METRIC_UNIQUE_MERCHANTS,
];

/// `{metric}_{window}d`.
pub fn column_name(metric: &str, window: WindowDays) -> String {
    format!("{metric}_{window}d")
}

/// All aggregate column names for `windows`, window-major.
pub fn column_names(windows: &[WindowDays]) -> Vec<String> {
    windows
        .iter()
        .flat_map(|w| METRICS.iter().map(move |m| column_name(m, *w)))
        .collect()
}

// ── Inputs with parsed dates ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationPoint {
    pub application_id: ApplicationId,
    pub customer_id: CustomerId,
    /// UTC instant; `None` when the raw date did not parse.
    pub application_date: Option<NaiveDateTime>,
}

impl From<&LoanApplication> for ApplicationPoint {
    fn from(app: &LoanApplication) -> Self {
        Self {
            application_id: app.application_id.clone(),
            customer_id: app.customer_id.clone(),
            application_date: parse_instant(&app.application_date),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPoint {
    pub customer_id: CustomerId,
    pub transaction_date: Option<NaiveDateTime>,
    pub amount: Option<f64>,
    pub merchant_category: Option<String>,
}

impl From<&Transaction> for TransactionPoint {
    fn from(txn: &Transaction) -> Self {
        Self {
            customer_id: txn.customer_id.clone(),
            transaction_date: parse_instant(&txn.transaction_date),
            amount: txn.transaction_amount,
            merchant_category: txn.merchant_category.clone(),
        }
    }
}

// ── Output ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMetrics {
    pub window_days: WindowDays,
    pub num_transactions: u64,
    pub total_transaction_amount: f64,
    /// 0 when the window holds no amounts. Never NaN.
    pub average_transaction_amount: f64,
    pub unique_merchant_categories: u64,
}

impl WindowMetrics {
    pub fn empty(window_days: WindowDays) -> Self {
        Self {
            window_days,
            num_transactions: 0,
            total_transaction_amount: 0.0,
            average_transaction_amount: 0.0,
            unique_merchant_categories: 0,
        }
    }
}

/// One application's point-in-time snapshot. Windows follow the
/// configured order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedFeatureRow {
    pub application_id: ApplicationId,
    pub windows: Vec<WindowMetrics>,
}

impl AggregatedFeatureRow {
    pub fn empty(application_id: ApplicationId, windows: &[WindowDays]) -> Self {
        Self {
            application_id,
            windows: windows.iter().map(|w| WindowMetrics::empty(*w)).collect(),
        }
    }

    pub fn window(&self, window_days: WindowDays) -> Option<&WindowMetrics> {
        self.windows.iter().find(|m| m.window_days == window_days)
    }

    /// `(column, value)` pairs in `column_names` order.
    pub fn named_values(&self) -> Vec<(String, FeatureValue)> {
        let mut out = Vec::with_capacity(self.windows.len() * METRICS.len());
        for m in &self.windows {
            let w = m.window_days;
            out.push((column_name(METRIC_NUM_TRANSACTIONS, w), (m.num_transactions as f64).into()));
            out.push((column_name(METRIC_TOTAL_AMOUNT, w), m.total_transaction_amount.into()));
            out.push((column_name(METRIC_AVERAGE_AMOUNT, w), m.average_transaction_amount.into()));
            out.push((
                column_name(METRIC_UNIQUE_MERCHANTS, w),
                (m.unique_merchant_categories as f64).into(),
            ));
        }
        out
    }
}

// ── Aggregator ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TransactionAggregator {
    windows: Vec<WindowDays>,
    /// Window indices sorted by ascending size, for the backward sweep.
    sweep_order: Vec<usize>,
    parallel: bool,
}

/// One customer's applications and dated transactions.
struct CustomerPartition<'a> {
    applications: Vec<&'a ApplicationPoint>,
    transactions: Vec<&'a TransactionPoint>,
}

impl TransactionAggregator {
    pub fn new(windows: Vec<WindowDays>) -> ScoreResult<Self> {
        validate_windows(&windows)?;
        let mut sweep_order: Vec<usize> = (0..windows.len()).collect();
        sweep_order.sort_by_key(|i| windows[*i]);
        Ok(Self { windows, sweep_order, parallel: false })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn windows(&self) -> &[WindowDays] {
        &self.windows
    }

    /// Parse dates on raw records, then aggregate.
    pub fn aggregate_records(
        &self,
        applications: &[LoanApplication],
        transactions: &[Transaction],
    ) -> Vec<AggregatedFeatureRow> {
        let apps: Vec<ApplicationPoint> = applications.iter().map(ApplicationPoint::from).collect();
        let txns: Vec<TransactionPoint> = transactions.iter().map(TransactionPoint::from).collect();
        self.aggregate(&apps, &txns)
    }

    pub fn aggregate(
        &self,
        applications: &[ApplicationPoint],
        transactions: &[TransactionPoint],
    ) -> Vec<AggregatedFeatureRow> {
        let partitions = self.partition(applications, transactions);

        log::info!(
            "aggregation: {} applications, {} transactions, {} customers, windows {:?}",
            applications.len(),
            transactions.len(),
            partitions.len(),
            self.windows
        );

        let mut rows: Vec<AggregatedFeatureRow> = if self.parallel {
            partitions
                .par_iter()
                .flat_map_iter(|p| self.aggregate_partition(p))
                .collect()
        } else {
            partitions
                .iter()
                .flat_map(|p| self.aggregate_partition(p))
                .collect()
        };

        rows.sort_by(|a, b| a.application_id.cmp(&b.application_id));
        rows
    }

    /// Group by customer, deduplicating applications by id (first wins).
    /// Transactions without a usable date can never precede an
    /// application and are left out here.
    fn partition<'a>(
        &self,
        applications: &'a [ApplicationPoint],
        transactions: &'a [TransactionPoint],
    ) -> Vec<CustomerPartition<'a>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut by_customer: HashMap<&str, CustomerPartition<'a>> = HashMap::new();

        for app in applications {
            if !seen.insert(app.application_id.as_str()) {
                log::warn!(
                    "aggregation: duplicate application_id {} ignored",
                    app.application_id
                );
                continue;
            }
            by_customer
                .entry(app.customer_id.as_str())
                .or_insert_with(|| CustomerPartition {
                    applications: Vec::new(),
                    transactions: Vec::new(),
                })
                .applications
                .push(app);
        }

        let mut undated = 0usize;
        for txn in transactions {
            if txn.transaction_date.is_none() {
                undated += 1;
                continue;
            }
            if let Some(partition) = by_customer.get_mut(txn.customer_id.as_str()) {
                partition.transactions.push(txn);
            }
        }
        if undated > 0 {
            log::debug!("aggregation: {undated} transactions with unparseable dates skipped");
        }

        let mut partitions: Vec<(&str, CustomerPartition<'a>)> = by_customer.into_iter().collect();
        partitions.sort_by(|a, b| a.0.cmp(b.0));
        partitions.into_iter().map(|(_, p)| p).collect()
    }

    fn aggregate_partition(&self, partition: &CustomerPartition<'_>) -> Vec<AggregatedFeatureRow> {
        let mut txns = partition.transactions.clone();
        txns.sort_by_key(|t| t.transaction_date);

        partition
            .applications
            .iter()
            .map(|app| match app.application_date {
                Some(date) => self.aggregate_one(&app.application_id, date, &txns),
                None => AggregatedFeatureRow::empty(app.application_id.clone(), &self.windows),
            })
            .collect()
    }

    /// `txns` must be sorted by date and carry dates.
    fn aggregate_one(
        &self,
        application_id: &str,
        application_date: NaiveDateTime,
        txns: &[&TransactionPoint],
    ) -> AggregatedFeatureRow {
        let cutoff = txns.partition_point(|t| t.transaction_date < Some(application_date));

        let mut metrics: Vec<WindowMetrics> =
            self.windows.iter().map(|w| WindowMetrics::empty(*w)).collect();

        let mut idx = cutoff;
        let mut count = 0u64;
        let mut total = 0.0f64;
        let mut amounts = 0u64;
        let mut merchants: HashSet<&str> = HashSet::new();

        for &wi in &self.sweep_order {
            let window = self.windows[wi];
            let start = application_date.checked_sub_signed(Duration::days(i64::from(window)));

            while idx > 0 {
                let txn = txns[idx - 1];
                let in_window = match (start, txn.transaction_date) {
                    (Some(start), Some(date)) => date >= start,
                    (None, Some(_)) => true,
                    (_, None) => false,
                };
                if !in_window {
                    break;
                }
                idx -= 1;
                count += 1;
                if let Some(amount) = txn.amount {
                    total += amount;
                    amounts += 1;
                }
                if let Some(category) = txn.merchant_category.as_deref() {
                    merchants.insert(category);
                }
            }

            metrics[wi] = WindowMetrics {
                window_days: window,
                num_transactions: count,
                total_transaction_amount: total,
                average_transaction_amount: if amounts > 0 { total / amounts as f64 } else { 0.0 },
                unique_merchant_categories: merchants.len() as u64,
            };
        }

        AggregatedFeatureRow {
            application_id: application_id.to_string(),
            windows: metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_window_major() {
        assert_eq!(
            column_names(&[30, 90]),
            vec![
                "num_transactions_30d",
                "total_transaction_amount_30d",
                "average_transaction_amount_30d",
                "unique_merchant_categories_30d",
                "num_transactions_90d",
                "total_transaction_amount_90d",
                "average_transaction_amount_90d",
                "unique_merchant_categories_90d",
            ]
        );
    }

    #[test]
    fn rejects_empty_window_list() {
        assert!(TransactionAggregator::new(vec![]).is_err());
        assert!(TransactionAggregator::new(vec![30, 30]).is_err());
    }

    #[test]
    fn named_values_match_column_names() {
        let row = AggregatedFeatureRow::empty("A1".into(), &[7, 365]);
        let names: Vec<String> = row.named_values().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, column_names(&[7, 365]));
    }
}
