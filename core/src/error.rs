use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Warehouse error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL file not found: {path}")]
    MissingQuery { path: String },

    #[error("Column '{column}' not present in result set")]
    MissingColumn { column: String },

    #[error("Column '{column}' row {row}: expected {expected}")]
    BadValue {
        column: String,
        row: usize,
        expected: &'static str,
    },

    #[error("Invalid cohort month '{value}': expected YYYY-MM")]
    InvalidCohort { value: String },

    #[error("Invalid timestamp '{value}' in {column}: expected YYYY-MM-DD[ HH:MM:SS]")]
    InvalidTimestamp { column: &'static str, value: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;
