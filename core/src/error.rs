use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    InputNotFound { path: String },

    #[error("File is empty: {path}")]
    EmptyInput { path: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Feature width mismatch: model expects {expected} features, got {actual}")]
    FeatureWidthMismatch { expected: usize, actual: usize },

    #[error("Column '{column}' expects a numeric value, got '{value}'")]
    ColumnTypeMismatch { column: String, value: String },

    #[error("Column '{column}' is not present in the feature table")]
    UnknownColumn { column: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ScoreResult<T> = Result<T, ScoreError>;
