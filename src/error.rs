//! Error type shared by the route optimizer.

/// Errors raised while loading locations or configuring a run.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;

impl SolverError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SolverError::InvalidInput(message.into())
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        SolverError::Parse { line, message: message.into() }
    }
}
