//! The model's input contract: an ordered list of named columns, each
//! with the value used when an assembled table lacks it.
//!
//! Reconciliation projects any feature table onto this schema. Absent
//! columns are filled with their default and reported at warn level,
//! since a zero-filled column may be real signal gone missing upstream.
//! Columns the schema does not name are dropped.

use crate::{
    error::ScoreResult,
    table::{FeatureTable, FeatureValue},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub default: FeatureValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedSchema {
    fields: Vec<SchemaField>,
}

impl ExpectedSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    /// Every column defaults to zero.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: columns
                .into_iter()
                .map(|name| SchemaField {
                    name: name.into(),
                    default: FeatureValue::Number(0.0),
                })
                .collect(),
        }
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Expected columns the table does not carry.
    pub fn missing_from(&self, table: &FeatureTable) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !table.has_column(&f.name))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Project `table` onto this schema, keeping row order.
    pub fn reconcile(&self, table: &FeatureTable) -> ScoreResult<FeatureTable> {
        let missing = self.missing_from(table);
        if !missing.is_empty() {
            log::warn!(
                "reconcile: {} expected columns absent, filled with defaults: {}",
                missing.len(),
                missing.join(", ")
            );
        }

        let extra: Vec<&str> = table
            .columns()
            .iter()
            .filter(|c| !self.fields.iter().any(|f| &f.name == *c))
            .map(String::as_str)
            .collect();
        if !extra.is_empty() {
            log::debug!("reconcile: dropping unexpected columns: {}", extra.join(", "));
        }

        let sources: Vec<Option<usize>> =
            self.fields.iter().map(|f| table.column_index(&f.name)).collect();

        let mut out = FeatureTable::new(self.column_names());
        for row in table.rows() {
            let values = self
                .fields
                .iter()
                .zip(&sources)
                .map(|(field, src)| match src {
                    Some(i) => row[*i].clone(),
                    None => field.default.clone(),
                })
                .collect();
            out.push_row(values)?;
        }
        Ok(out)
    }
}
