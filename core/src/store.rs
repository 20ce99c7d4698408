//! SQLite record of scoring decisions.
//!
//! RULE: Only store.rs talks to the database.
//! Trained models are never stored here, only the outcomes they produced.

use crate::{
    credit::{CreditAssessment, CreditLabel},
    error::ScoreResult,
    scoring::ScoreOutcome,
    types::BatchId,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

pub struct ScoreStore {
    conn: Connection,
}

impl ScoreStore {
    /// Open (or create) the decision database at `path`.
    pub fn open(path: &str) -> ScoreResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; ignore failures elsewhere.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ScoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ScoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_scoring.sql"))?;
        Ok(())
    }

    // ── Batches ────────────────────────────────────────────────

    /// Register a new batch and return its id.
    pub fn begin_batch(&self, source: &str, application_count: usize) -> ScoreResult<BatchId> {
        let batch_id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO scoring_batch (batch_id, created_at, source, application_count)
             VALUES (?1, ?2, ?3, ?4)",
            params![batch_id, created_at, source, application_count as i64],
        )?;
        Ok(batch_id)
    }

    pub fn batch_count(&self) -> ScoreResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM scoring_batch", [], |r| r.get(0))?)
    }

    // ── Outcomes ───────────────────────────────────────────────

    pub fn insert_outcome(&self, batch_id: &str, outcome: &ScoreOutcome) -> ScoreResult<()> {
        self.conn.execute(
            "INSERT INTO score_outcome (
                 batch_id, application_id, fraud_flag, fraud_probability,
                 credit_score, credit_label
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                batch_id,
                outcome.application_id,
                outcome.fraud_flag,
                outcome.fraud_probability,
                outcome.credit.map(|c| c.score),
                outcome.credit.map(|c| c.label.as_str()),
            ],
        )?;
        Ok(())
    }

    /// Insert every outcome of a batch in one transaction.
    pub fn record_outcomes(&mut self, batch_id: &str, outcomes: &[ScoreOutcome]) -> ScoreResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO score_outcome (
                     batch_id, application_id, fraud_flag, fraud_probability,
                     credit_score, credit_label
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for outcome in outcomes {
                stmt.execute(params![
                    batch_id,
                    outcome.application_id,
                    outcome.fraud_flag,
                    outcome.fraud_probability,
                    outcome.credit.map(|c| c.score),
                    outcome.credit.map(|c| c.label.as_str()),
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("store: recorded {} outcomes for batch {batch_id}", outcomes.len());
        Ok(())
    }

    pub fn outcomes_for_batch(&self, batch_id: &str) -> ScoreResult<Vec<ScoreOutcome>> {
        let mut stmt = self.conn.prepare(
            "SELECT application_id, fraud_flag, fraud_probability, credit_score, credit_label
             FROM score_outcome WHERE batch_id = ?1
             ORDER BY id ASC",
        )?;
        let outcomes = stmt
            .query_map(params![batch_id], |row| {
                let score: Option<f64> = row.get(3)?;
                let label: Option<String> = row.get(4)?;
                let credit = match (score, label.as_deref().and_then(CreditLabel::parse)) {
                    (Some(score), Some(label)) => Some(CreditAssessment { score, label }),
                    _ => None,
                };
                Ok(ScoreOutcome {
                    application_id: row.get(0)?,
                    fraud_flag: row.get(1)?,
                    fraud_probability: row.get(2)?,
                    credit,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(outcomes)
    }

    pub fn outcome_count(&self, batch_id: &str) -> ScoreResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM score_outcome WHERE batch_id = ?1",
            params![batch_id],
            |r| r.get(0),
        )?)
    }

    pub fn flagged_count(&self, batch_id: &str) -> ScoreResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM score_outcome WHERE batch_id = ?1 AND fraud_flag = 1",
            params![batch_id],
            |r| r.get(0),
        )?)
    }
}
