//! Model-input preparation: label separation and the fitted column
//! transform (standard scaling for numeric columns, one-hot encoding for
//! categorical ones).
//!
//! Output layout: all scaled numeric columns in input order, then the
//! one-hot blocks in input order. Output names are `num__{column}` and
//! `cat__{column}_{category}`.

use crate::{
    error::{ScoreError, ScoreResult},
    model::ColumnTransform,
    table::{FeatureTable, FeatureValue},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ── Labels ───────────────────────────────────────────────────────────────────

pub const FRAUD_FLAG_COLUMN: &str = "fraud_flag";
pub const LOAN_STATUS_COLUMN: &str = "loan_status";

/// Features with their training targets split off.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledFeatures {
    pub features: FeatureTable,
    /// `None` where the row carried no usable fraud flag.
    pub fraud_flags: Vec<Option<bool>>,
    pub loan_status: Vec<Option<String>>,
}

/// Take the targets out of an engineered table, then drop `drop_columns`.
pub fn split_labels(mut table: FeatureTable, drop_columns: &[String]) -> LabeledFeatures {
    let rows = table.len();

    let fraud_flags = table
        .take_column(FRAUD_FLAG_COLUMN)
        .map(|col| {
            col.into_iter()
                .map(|v| v.as_number().map(|n| n != 0.0))
                .collect()
        })
        .unwrap_or_else(|| vec![None; rows]);

    let loan_status = table
        .take_column(LOAN_STATUS_COLUMN)
        .map(|col| col.into_iter().map(|v| v.as_text().map(str::to_string)).collect())
        .unwrap_or_else(|| vec![None; rows]);

    table.drop_columns(drop_columns);

    LabeledFeatures {
        features: table,
        fraud_flags,
        loan_status,
    }
}

// ── Column kinds ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// A column is numeric when every present value is a number. An
/// all-missing column counts as numeric.
pub fn infer_column_kinds(table: &FeatureTable) -> Vec<(String, ColumnKind)> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let numeric = table
                .rows()
                .iter()
                .all(|r| matches!(r[i], FeatureValue::Number(_) | FeatureValue::Missing));
            let kind = if numeric { ColumnKind::Numeric } else { ColumnKind::Categorical };
            (name.clone(), kind)
        })
        .collect()
}

fn category_key(value: &FeatureValue) -> Option<String> {
    match value {
        FeatureValue::Text(s) => Some(s.clone()),
        FeatureValue::Number(n) => Some(n.to_string()),
        FeatureValue::Missing => None,
    }
}

// ── Transformer ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericScaler {
    pub column: String,
    pub mean: f64,
    /// Population standard deviation; 1.0 for constant columns.
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotColumn {
    pub column: String,
    /// Sorted, distinct.
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    feature_names_in: Vec<String>,
    numeric: Vec<NumericScaler>,
    categorical: Vec<OneHotColumn>,
}

impl ColumnTransformer {
    /// Fit scaling statistics and category sets on `table`.
    pub fn fit(table: &FeatureTable) -> ScoreResult<Self> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for (name, kind) in infer_column_kinds(table) {
            let values = table.column_values(&name)?;
            match kind {
                ColumnKind::Numeric => {
                    let present: Vec<f64> = values.iter().filter_map(|v| v.as_number()).collect();
                    let (mean, scale) = mean_and_scale(&present);
                    numeric.push(NumericScaler { column: name, mean, scale });
                }
                ColumnKind::Categorical => {
                    let categories: BTreeSet<String> =
                        values.iter().filter_map(|v| category_key(v)).collect();
                    categorical.push(OneHotColumn {
                        column: name,
                        categories: categories.into_iter().collect(),
                    });
                }
            }
        }

        log::info!(
            "preprocess: fitted {} numeric and {} categorical columns over {} rows",
            numeric.len(),
            categorical.len(),
            table.len()
        );

        Ok(Self {
            feature_names_in: table.columns().to_vec(),
            numeric,
            categorical,
        })
    }

    pub fn numeric_columns(&self) -> &[NumericScaler] {
        &self.numeric
    }

    pub fn categorical_columns(&self) -> &[OneHotColumn] {
        &self.categorical
    }

    pub fn feature_names_out(&self) -> Vec<String> {
        let num = self.numeric.iter().map(|s| format!("num__{}", s.column));
        let cat = self.categorical.iter().flat_map(|c| {
            c.categories
                .iter()
                .map(move |cat| format!("cat__{}_{}", c.column, cat))
        });
        num.chain(cat).collect()
    }

    pub fn n_features_out(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
    }
}

fn mean_and_scale(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    let scale = if std > 0.0 && std.is_finite() { std } else { 1.0 };
    (mean, scale)
}

fn column_index(table: &FeatureTable, column: &str) -> ScoreResult<usize> {
    table
        .column_index(column)
        .ok_or_else(|| ScoreError::UnknownColumn { column: column.to_string() })
}

impl ColumnTransform for ColumnTransformer {
    fn feature_names_in(&self) -> &[String] {
        &self.feature_names_in
    }

    fn transform(&self, table: &FeatureTable) -> ScoreResult<Vec<Vec<f64>>> {
        let num_idx: Vec<usize> = self
            .numeric
            .iter()
            .map(|s| column_index(table, &s.column))
            .collect::<ScoreResult<_>>()?;
        let cat_idx: Vec<usize> = self
            .categorical
            .iter()
            .map(|c| column_index(table, &c.column))
            .collect::<ScoreResult<_>>()?;

        let mut out = Vec::with_capacity(table.len());
        for row in table.rows() {
            let mut x = Vec::with_capacity(self.n_features_out());

            for (scaler, &i) in self.numeric.iter().zip(&num_idx) {
                let value = match &row[i] {
                    FeatureValue::Number(n) => *n,
                    // Imputed at the fitted mean, i.e. 0 after scaling.
                    FeatureValue::Missing => scaler.mean,
                    FeatureValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                        ScoreError::ColumnTypeMismatch {
                            column: scaler.column.clone(),
                            value: s.clone(),
                        }
                    })?,
                };
                x.push((value - scaler.mean) / scaler.scale);
            }

            for (onehot, &i) in self.categorical.iter().zip(&cat_idx) {
                let key = category_key(&row[i]);
                // Unknown categories encode as all zeros.
                x.extend(
                    onehot
                        .categories
                        .iter()
                        .map(|c| if key.as_deref() == Some(c.as_str()) { 1.0 } else { 0.0 }),
                );
            }

            out.push(x);
        }
        Ok(out)
    }
}
