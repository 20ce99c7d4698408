use crate::{
    error::{ScoreError, ScoreResult},
    types::WindowDays,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Trailing windows used when no configuration file overrides them.
pub const DEFAULT_WINDOWS: [WindowDays; 4] = [30, 90, 180, 365];

/// Identifier and label columns that never reach the model.
pub const DEFAULT_DROP_COLUMNS: [&str; 7] = [
    "application_id",
    "customer_id",
    "application_date",
    "residential_address",
    "fraud_flag",
    "fraud_type",
    "loan_status",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Aggregation windows in days, in output column order.
    #[serde(default = "default_windows")]
    pub windows: Vec<WindowDays>,
    /// Columns removed before reconciliation.
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
    /// Aggregate customer partitions on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

fn default_windows() -> Vec<WindowDays> {
    DEFAULT_WINDOWS.to_vec()
}

fn default_drop_columns() -> Vec<String> {
    DEFAULT_DROP_COLUMNS.iter().map(|c| c.to_string()).collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
            drop_columns: default_drop_columns(),
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Load from `{data_dir}/pipeline.json`. Missing keys take defaults.
    /// In tests, use `PipelineConfig::default()`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/pipeline.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_windows(mut self, windows: Vec<WindowDays>) -> Self {
        self.windows = windows;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> ScoreResult<()> {
        validate_windows(&self.windows)
    }
}

/// Windows must be non-empty, positive, and distinct (each one names
/// its own output columns).
pub fn validate_windows(windows: &[WindowDays]) -> ScoreResult<()> {
    if windows.is_empty() {
        return Err(ScoreError::InvalidConfig {
            reason: "at least one aggregation window is required".into(),
        });
    }
    if windows.contains(&0) {
        return Err(ScoreError::InvalidConfig {
            reason: "aggregation windows must be at least one day".into(),
        });
    }
    let mut seen = HashSet::new();
    if let Some(dup) = windows.iter().find(|w| !seen.insert(**w)) {
        return Err(ScoreError::InvalidConfig {
            reason: format!("aggregation window {dup}d listed twice"),
        });
    }
    Ok(())
}
