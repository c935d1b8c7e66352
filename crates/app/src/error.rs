use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("ingest error: {0}")]
    Ingest(#[from] ingest::IngestError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),
    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Error payload for machine-readable output.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let code = match &err {
            AppError::InvalidInput(_) => Some("invalid_input".to_string()),
            AppError::Ingest(ingest::IngestError::Validation(_)) => {
                Some("validation_failed".to_string())
            }
            AppError::Ingest(_) | AppError::Io(_) | AppError::Serde(_) | AppError::Pattern(_) => {
                None
            }
        };
        Self {
            message: err.to_string(),
            code,
        }
    }
}
