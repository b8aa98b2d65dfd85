use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid amount value '{value}' in year column {year}")]
    InvalidAmount { year: i32, value: String },

    #[error("Missing required subject: {0}")]
    MissingRequiredSubject(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalysisError {
    /// Machine-readable code carried by every typed failure.
    pub fn code(&self) -> u32 {
        match self {
            AnalysisError::InvalidRequest(_) => 1001,
            AnalysisError::ParseError(_) => 1004,
            AnalysisError::ValidationError(_) => 1005,
            AnalysisError::MissingRequiredSubject(_) => 1101,
            AnalysisError::InvalidAmount { .. } => 1103,
            AnalysisError::StorageError(_)
            | AnalysisError::SerializationError(_)
            | AnalysisError::IoError(_) => 2001,
        }
    }

    /// HTTP-equivalent status a transport adapter should surface.
    pub fn status(&self) -> u16 {
        match self {
            AnalysisError::StorageError(_)
            | AnalysisError::SerializationError(_)
            | AnalysisError::IoError(_) => 500,
            _ => 400,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AnalysisError::ParseError("x".to_string()).code(), 1004);
        assert_eq!(
            AnalysisError::InvalidAmount {
                year: 2023,
                value: "abc".to_string()
            }
            .code(),
            1103
        );
        assert_eq!(
            AnalysisError::MissingRequiredSubject("roe".to_string()).code(),
            1101
        );
        assert_eq!(AnalysisError::ValidationError("empty".to_string()).status(), 400);
        assert_eq!(AnalysisError::InvalidRequest("nope".to_string()).code(), 1001);
    }
}
