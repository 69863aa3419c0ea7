// src/application/error_handling.rs
//
// Error responses for views
//
// ARCHITECTURE:
// - Maps internal errors → view-friendly responses
// - Provides one error format for every command
// - `retryable` drives the view's retry affordance
// - Logs errors for debugging

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard error response for views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

/// Error categories for views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Resource not found (404)
    NotFound,

    /// Invalid input (400)
    Validation,

    /// Session expired or credentials rejected (401)
    Unauthorized,

    /// Backend unreachable
    Network,

    /// Backend answered with an error, or a slice request failed
    ExternalService,

    /// Local storage error
    Database,

    /// Other/unknown error
    Internal,
}

impl ErrorResponse {
    fn new(error_type: ErrorType, message: String, details: Option<String>, retryable: bool) -> Self {
        Self {
            success: false,
            error_type,
            message,
            details,
            retryable,
        }
    }

    /// Create error response from AppError
    pub fn from_app_error(error: &AppError) -> Self {
        let retryable = error.is_retryable();
        match error {
            AppError::NotFound(message) => {
                Self::new(ErrorType::NotFound, message.clone(), None, false)
            }

            AppError::Validation(message) => {
                Self::new(ErrorType::Validation, message.clone(), None, false)
            }

            AppError::Unauthorized(message) => Self::new(
                ErrorType::Unauthorized,
                "Session expired, please sign in again".to_string(),
                Some(message.clone()),
                false,
            ),

            AppError::Network(message) => Self::new(
                ErrorType::Network,
                "Could not reach the server".to_string(),
                Some(message.clone()),
                retryable,
            ),

            AppError::Api {
                status,
                message,
                details,
            } => {
                let kind = if *status == 404 {
                    ErrorType::NotFound
                } else {
                    ErrorType::ExternalService
                };
                Self::new(
                    kind,
                    message.clone(),
                    details.as_ref().map(|d| d.to_string()),
                    retryable,
                )
            }

            AppError::Database(_) | AppError::Pool(_) => {
                log::error!("Storage error: {}", error);
                Self::new(
                    ErrorType::Database,
                    "Local storage failed".to_string(),
                    Some("Check logs for details".to_string()),
                    false,
                )
            }

            other => {
                log::error!("Internal error: {}", other);
                Self::new(ErrorType::Internal, other.to_string(), None, false)
            }
        }
    }

    /// Create error response from a failed slice request. The message is
    /// the one recorded on the slice.
    pub fn fetch_failed(slice: &str, message: String) -> Self {
        Self::new(
            ErrorType::ExternalService,
            message,
            Some(format!("{} request failed", slice)),
            true,
        )
    }

    /// Create error response for a request that a newer one replaced
    /// before it could be served.
    pub fn superseded(slice: &str, key: &str) -> Self {
        Self::new(
            ErrorType::ExternalService,
            format!("Request for {} was replaced by a newer one", key),
            Some(format!("{} request superseded", slice)),
            true,
        )
    }

    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Validation, message.into(), None, false)
    }
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self::from_app_error(&error)
    }
}
