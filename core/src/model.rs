//! Collaborator contracts for the trained model, and the context object
//! that owns a loaded bundle.
//!
//! RULE: nothing holds a model globally. A `ModelContext` is built once
//! by the caller and passed to whatever scores with it.

use crate::{
    error::{ScoreError, ScoreResult},
    preprocess::ColumnTransformer,
    schema::ExpectedSchema,
    table::FeatureTable,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fitted transform from a reconciled feature table to a dense matrix.
pub trait ColumnTransform: Send + Sync {
    /// The ordered input columns the transform was fitted on.
    fn feature_names_in(&self) -> &[String];

    fn transform(&self, table: &FeatureTable) -> ScoreResult<Vec<Vec<f64>>>;
}

/// A binary fraud classifier over transformed rows.
pub trait FraudClassifier: Send + Sync {
    /// Probability of the fraud class, one per row.
    fn predict_proba(&self, features: &[Vec<f64>]) -> ScoreResult<Vec<f64>>;

    /// Probability at or above which a row is labelled fraudulent.
    fn threshold(&self) -> f64 {
        0.5
    }

    fn predict(&self, features: &[Vec<f64>]) -> ScoreResult<Vec<bool>> {
        let threshold = self.threshold();
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| p >= threshold)
            .collect())
    }
}

// ── Logistic model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl LogisticModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            threshold: default_threshold(),
        }
    }

    pub fn decision(&self, row: &[f64]) -> ScoreResult<f64> {
        if row.len() != self.coefficients.len() {
            return Err(ScoreError::FeatureWidthMismatch {
                expected: self.coefficients.len(),
                actual: row.len(),
            });
        }
        Ok(self.intercept + row.iter().zip(&self.coefficients).map(|(x, w)| x * w).sum::<f64>())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl FraudClassifier for LogisticModel {
    fn predict_proba(&self, features: &[Vec<f64>]) -> ScoreResult<Vec<f64>> {
        features
            .iter()
            .map(|row| self.decision(row).map(sigmoid))
            .collect()
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

// ── Bundle and context ───────────────────────────────────────────────────────

/// The on-disk form of a trained model: classifier, fitted transform,
/// and the transform's output column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub classifier: LogisticModel,
    pub preprocessor: ColumnTransformer,
    #[serde(default)]
    pub feature_columns: Vec<String>,
}

impl ModelBundle {
    pub fn into_context(self) -> ScoreResult<ModelContext> {
        let width = self.preprocessor.n_features_out();
        if width != self.classifier.coefficients.len() {
            return Err(ScoreError::FeatureWidthMismatch {
                expected: self.classifier.coefficients.len(),
                actual: width,
            });
        }
        if !self.feature_columns.is_empty()
            && self.feature_columns != self.preprocessor.feature_names_out()
        {
            log::warn!("model: bundle feature_columns differ from the preprocessor's output names");
        }
        Ok(ModelContext::new(
            Box::new(self.classifier),
            Box::new(self.preprocessor),
        ))
    }
}

/// Everything needed to score: the classifier, its input transform, and
/// the schema assembled features are reconciled onto.
pub struct ModelContext {
    classifier: Box<dyn FraudClassifier>,
    transform: Box<dyn ColumnTransform>,
    schema: ExpectedSchema,
}

impl ModelContext {
    /// The schema defaults to the transform's input columns, zero-filled.
    pub fn new(classifier: Box<dyn FraudClassifier>, transform: Box<dyn ColumnTransform>) -> Self {
        let schema = ExpectedSchema::from_columns(transform.feature_names_in().iter().cloned());
        Self {
            classifier,
            transform,
            schema,
        }
    }

    pub fn with_schema(mut self, schema: ExpectedSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Load a JSON bundle from `path`.
    pub fn load(path: &str) -> ScoreResult<Self> {
        if !Path::new(path).exists() {
            return Err(ScoreError::InputNotFound { path: path.to_string() });
        }
        let content = std::fs::read_to_string(path)?;
        let bundle: ModelBundle = serde_json::from_str(&content)?;
        let context = bundle.into_context()?;
        log::info!(
            "model: loaded bundle from {path} ({} input columns)",
            context.schema.len()
        );
        Ok(context)
    }

    pub fn classifier(&self) -> &dyn FraudClassifier {
        self.classifier.as_ref()
    }

    pub fn transform(&self) -> &dyn ColumnTransform {
        self.transform.as_ref()
    }

    pub fn schema(&self) -> &ExpectedSchema {
        &self.schema
    }
}
