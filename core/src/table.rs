//! Column-named feature tables.
//!
//! A `FeatureTable` is a dense, row-major table with an ordered column
//! list. Every row has exactly one value per column. Values are numeric,
//! text (categorical), or missing.

use crate::error::{ScoreError, ScoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureValue::Missing)
    }
}

impl From<f64> for FeatureValue {
    fn from(n: f64) -> Self {
        FeatureValue::Number(n)
    }
}

impl From<Option<f64>> for FeatureValue {
    fn from(n: Option<f64>) -> Self {
        n.map_or(FeatureValue::Missing, FeatureValue::Number)
    }
}

impl From<Option<String>> for FeatureValue {
    fn from(s: Option<String>) -> Self {
        s.map_or(FeatureValue::Missing, FeatureValue::Text)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Build a table from `(column, value)` rows. The first row fixes
    /// the column order; every later row must carry the same columns.
    pub fn from_named_rows(rows: Vec<Vec<(String, FeatureValue)>>) -> ScoreResult<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::default());
        };
        let columns: Vec<String> = first.iter().map(|(name, _)| name.clone()).collect();
        let mut table = Self::new(columns);
        for row in rows {
            let mut by_name: HashMap<String, FeatureValue> = row.into_iter().collect();
            let mut values = Vec::with_capacity(table.columns.len());
            for column in &table.columns {
                let value = by_name
                    .remove(column)
                    .ok_or_else(|| ScoreError::UnknownColumn { column: column.clone() })?;
                values.push(value);
            }
            if let Some(extra) = by_name.into_keys().next() {
                return Err(ScoreError::UnknownColumn { column: extra });
            }
            table.rows.push(values);
        }
        Ok(table)
    }

    pub fn push_row(&mut self, values: Vec<FeatureValue>) -> ScoreResult<()> {
        if values.len() != self.columns.len() {
            return Err(ScoreError::FeatureWidthMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<FeatureValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value at (`row`, `column`), or `None` when either is out of range.
    pub fn get(&self, row: usize, column: &str) -> Option<&FeatureValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn column_values(&self, column: &str) -> ScoreResult<Vec<&FeatureValue>> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| ScoreError::UnknownColumn { column: column.to_string() })?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Remove every listed column that is present. Absent names are ignored.
    pub fn drop_columns(&mut self, names: &[String]) {
        let keep: Vec<bool> = self.columns.iter().map(|c| !names.contains(c)).collect();
        if keep.iter().all(|k| *k) {
            return;
        }
        self.columns = retain_by_mask(std::mem::take(&mut self.columns), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
    }

    /// Split off a column, returning its values. The column is removed.
    pub fn take_column(&mut self, name: &str) -> Option<Vec<FeatureValue>> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|r| r.remove(idx)).collect())
    }
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, k)| k.then_some(item))
        .collect()
}
