//! End-to-end scoring of an application batch.
//!
//! Flow per batch:
//!   1. Engineer and reconcile features onto the model's schema.
//!   2. Transform and classify.
//!   3. Clean applications additionally get a creditworthiness score.
//!
//! Outcomes come back in the same order as the input applications.

use crate::{
    assembly::FeaturePipeline,
    config::PipelineConfig,
    credit::{assess, CreditAssessment, CreditInputs},
    error::{ScoreError, ScoreResult},
    model::ModelContext,
    record::{LoanApplication, Transaction},
    types::ApplicationId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub application_id: ApplicationId,
    pub fraud_flag: bool,
    pub fraud_probability: f64,
    /// Present only when `fraud_flag` is false.
    pub credit: Option<CreditAssessment>,
}

pub struct LoanScorer<'a> {
    context: &'a ModelContext,
    pipeline: FeaturePipeline,
}

impl<'a> LoanScorer<'a> {
    pub fn new(context: &'a ModelContext, config: &PipelineConfig) -> ScoreResult<Self> {
        Ok(Self {
            context,
            pipeline: FeaturePipeline::new(config)?,
        })
    }

    pub fn score(
        &self,
        applications: &[LoanApplication],
        transactions: &[Transaction],
    ) -> ScoreResult<Vec<ScoreOutcome>> {
        if applications.is_empty() {
            return Ok(Vec::new());
        }

        let features =
            self.pipeline
                .reconciled(applications, transactions, self.context.schema())?;
        let matrix = self.context.transform().transform(&features)?;
        let classifier = self.context.classifier();
        let probabilities = classifier.predict_proba(&matrix)?;

        if probabilities.len() != applications.len() {
            return Err(ScoreError::Other(anyhow::anyhow!(
                "classifier returned {} probabilities for {} applications",
                probabilities.len(),
                applications.len()
            )));
        }

        let threshold = classifier.threshold();
        let outcomes: Vec<ScoreOutcome> = applications
            .iter()
            .zip(probabilities)
            .map(|(app, probability)| {
                let flagged = probability >= threshold;
                ScoreOutcome {
                    application_id: app.application_id.clone(),
                    fraud_flag: flagged,
                    fraud_probability: probability,
                    credit: (!flagged).then(|| assess(&CreditInputs::from(app))),
                }
            })
            .collect();

        let flagged = outcomes.iter().filter(|o| o.fraud_flag).count();
        log::info!(
            "scoring: {} applications scored, {} flagged as fraudulent",
            outcomes.len(),
            flagged
        );

        Ok(outcomes)
    }
}
