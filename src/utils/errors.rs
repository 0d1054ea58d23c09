//! Error handling for the Vinsmoke console
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for the Vinsmoke console
#[derive(Error, Debug)]
pub enum VinsmokeError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication expired")]
    AuthExpired,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Backend under maintenance: {0}")]
    Maintenance(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Login locked, retry in {seconds_remaining}s")]
    LoginLocked { seconds_remaining: i64 },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for Vinsmoke console operations
pub type Result<T> = std::result::Result<T, VinsmokeError>;

impl VinsmokeError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            VinsmokeError::Http(_) => true,
            VinsmokeError::WebSocket(_) => true,
            VinsmokeError::Serialization(_) => false,
            VinsmokeError::Io(_) => true,
            VinsmokeError::UrlParse(_) => false,
            VinsmokeError::Config(_) => false,
            VinsmokeError::Api { status, .. } => *status >= 500,
            VinsmokeError::AuthExpired => false,
            VinsmokeError::NotAuthenticated => false,
            VinsmokeError::AccessDenied(_) => false,
            VinsmokeError::Maintenance(_) => true,
            VinsmokeError::PermissionDenied(_) => false,
            VinsmokeError::InvalidInput(_) => false,
            VinsmokeError::InvalidStateTransition { .. } => false,
            VinsmokeError::LoginLocked { .. } => true,
            VinsmokeError::Storage(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VinsmokeError::Config(_) => ErrorSeverity::Critical,
            VinsmokeError::AuthExpired => ErrorSeverity::Warning,
            VinsmokeError::NotAuthenticated => ErrorSeverity::Warning,
            VinsmokeError::AccessDenied(_) => ErrorSeverity::Warning,
            VinsmokeError::PermissionDenied(_) => ErrorSeverity::Warning,
            VinsmokeError::Maintenance(_) => ErrorSeverity::Warning,
            VinsmokeError::LoginLocked { .. } => ErrorSeverity::Warning,
            VinsmokeError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Generic message suitable for display, without internal details
    pub fn user_message(&self) -> String {
        match self {
            VinsmokeError::AuthExpired => "Session expired. Please sign in again.".to_string(),
            VinsmokeError::AccessDenied(_) => "Access denied.".to_string(),
            VinsmokeError::Maintenance(_) => {
                "This feature is under maintenance. It might not work properly.".to_string()
            }
            VinsmokeError::InvalidInput(msg) => msg.clone(),
            VinsmokeError::LoginLocked { seconds_remaining } => {
                format!("Too many attempts. Try again in {}s.", seconds_remaining)
            }
            _ => "An error occurred. Please try again.".to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classification() {
        assert_eq!(
            VinsmokeError::Config("missing".to_string()).severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(VinsmokeError::AuthExpired.severity(), ErrorSeverity::Warning);
        assert_eq!(
            VinsmokeError::InvalidInput("bad phone".to_string()).severity(),
            ErrorSeverity::Info
        );
    }

    #[test]
    fn test_api_error_recoverability() {
        let server = VinsmokeError::Api { status: 502, message: "bad gateway".to_string() };
        let client = VinsmokeError::Api { status: 404, message: "not found".to_string() };
        assert!(server.is_recoverable());
        assert!(!client.is_recoverable());
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = VinsmokeError::Api { status: 500, message: "stack trace".to_string() };
        assert!(!err.user_message().contains("stack trace"));
    }
}
