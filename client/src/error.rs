//! Error handling for the harvest planner client
//!
//! Validation failures stay inline in the dialog; every other error is shown
//! as a dismissible banner.

use serde::Serialize;
use shared::ValidationErrors;
use thiserror::Error;

use crate::store::StoreError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Form errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    // Data store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("No active dialog: {0}")]
    NoActiveDialog(&'static str),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

/// Banner shown above the harvest list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBanner {
    pub code: String,
    pub message: String,
    /// Whether retrying the same action may succeed
    pub retryable: bool,
}

impl ErrorBanner {
    fn new(code: &str, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            retryable,
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Store(_) => "STORE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::NoActiveDialog(_) => "NO_ACTIVE_DIALOG",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// Banner for this error; `None` for validation errors, which are shown
    /// next to the offending inputs instead
    pub fn banner(&self) -> Option<ErrorBanner> {
        let code = self.code();
        let banner = match self {
            AppError::Validation(_) => return None,
            AppError::Store(err) => ErrorBanner::new(
                code,
                format!("The data store request failed: {}", err),
                true,
            ),
            AppError::NotFound(resource) => {
                ErrorBanner::new(code, format!("{} not found", resource), false)
            }
            AppError::InvalidStateTransition(msg) => ErrorBanner::new(code, msg.clone(), false),
            AppError::NoActiveDialog(expected) => {
                ErrorBanner::new(code, format!("No {} dialog is open", expected), false)
            }
            AppError::Configuration(msg) => {
                ErrorBanner::new(code, format!("Configuration error: {}", msg), false)
            }
            AppError::Internal(_) => {
                ErrorBanner::new(code, "An unexpected error occurred", true)
            }
        };
        Some(banner)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias for orchestrator operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_has_no_banner() {
        let mut errors = ValidationErrors::new();
        errors.insert("crop", "Crop is required");
        let err = AppError::from(errors);
        assert!(err.is_validation());
        assert!(err.banner().is_none());
    }

    #[test]
    fn test_store_errors_are_retryable() {
        let err = AppError::from(StoreError::Backend("timeout".to_string()));
        let banner = err.banner().unwrap();
        assert_eq!(banner.code, "STORE_ERROR");
        assert!(banner.retryable);
        assert!(banner.message.contains("timeout"));
    }

    #[test]
    fn test_transition_errors_are_not_retryable() {
        let err = AppError::InvalidStateTransition("completed harvests cannot change".into());
        let banner = err.banner().unwrap();
        assert_eq!(banner.code, "INVALID_STATE_TRANSITION");
        assert!(!banner.retryable);
    }
}
