use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input, rejected at normalization time.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An edit that would leave a rate history without a rate.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Version conflict for project {project_id}: expected {expected}, found {actual}")]
    VersionConflict {
        project_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Invalid period format: {0}")]
    PeriodParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
