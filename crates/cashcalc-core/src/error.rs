use thiserror::Error;

#[derive(Debug, Error)]
pub enum SalaryEngineError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown city: {0}")]
    UnknownCity(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for SalaryEngineError {
    fn from(e: serde_json::Error) -> Self {
        SalaryEngineError::SerializationError(e.to_string())
    }
}
