// src/error/types.rs
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Session expired and could not be renewed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// A 2xx body that does not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            AppError::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// Whether repeating the same call could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Network(_) => true,
            AppError::Api { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            _ => false,
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Other(format!("Background task failed: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_status() {
        let err = AppError::Api {
            status: 503,
            message: "Service Unavailable".to_string(),
            details: None,
        };
        assert_eq!(err.to_string(), "API error (503): Service Unavailable");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Network("connection refused".into()).is_retryable());
        assert!(AppError::Api { status: 502, message: String::new(), details: None }.is_retryable());
        assert!(!AppError::Api { status: 404, message: String::new(), details: None }.is_retryable());
        assert!(!AppError::NotFound("Circuit not found".into()).is_retryable());
        assert!(!AppError::Unauthorized("expired".into()).is_retryable());
    }

    #[test]
    fn test_not_found_displays_bare_message() {
        let err = AppError::NotFound("Circuit not found".to_string());
        assert_eq!(err.to_string(), "Circuit not found");
    }
}
