//! Error handling for group billing
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for group billing operations
#[derive(Error, Debug)]
pub enum GroupBillingError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("External provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Group not found: {group_id}")]
    GroupNotFound { group_id: i64 },

    #[error("Enrollment not found: {enrollment_id}")]
    EnrollmentNotFound { enrollment_id: i64 },

    #[error("Invoice not found: {invoice_id}")]
    InvoiceNotFound { invoice_id: i64 },

    #[error("No pending enrollments for group {group_id}")]
    NoPendingEnrollments { group_id: i64 },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<config::ConfigError> for GroupBillingError {
    fn from(err: config::ConfigError) -> Self {
        GroupBillingError::Config(err.to_string())
    }
}

/// Errors raised by the host platform collaborators (catalog, LMS, identity)
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider timeout")]
    Timeout,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider service unavailable")]
    ServiceUnavailable,

    #[error("Operation not supported by provider: {0}")]
    Unsupported(String),
}

/// Result type alias for group billing operations
pub type Result<T> = std::result::Result<T, GroupBillingError>;

/// Result type alias for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl GroupBillingError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            GroupBillingError::Database(_) => false,
            GroupBillingError::Migration(_) => false,
            GroupBillingError::Provider(_) => true,
            GroupBillingError::Config(_) => false,
            GroupBillingError::PermissionDenied(_) => false,
            GroupBillingError::Authentication(_) => false,
            GroupBillingError::InvalidInput(_) => false,
            GroupBillingError::Duplicate(_) => false,
            GroupBillingError::GroupNotFound { .. } => false,
            GroupBillingError::EnrollmentNotFound { .. } => false,
            GroupBillingError::InvoiceNotFound { .. } => false,
            GroupBillingError::NoPendingEnrollments { .. } => false,
            GroupBillingError::Http(_) => true,
            GroupBillingError::Serialization(_) => false,
            GroupBillingError::Io(_) => true,
            GroupBillingError::UrlParse(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GroupBillingError::Database(_) => ErrorSeverity::Critical,
            GroupBillingError::Migration(_) => ErrorSeverity::Critical,
            GroupBillingError::Config(_) => ErrorSeverity::Critical,
            GroupBillingError::PermissionDenied(_) => ErrorSeverity::Warning,
            GroupBillingError::Authentication(_) => ErrorSeverity::Warning,
            GroupBillingError::InvalidInput(_) => ErrorSeverity::Info,
            GroupBillingError::Duplicate(_) => ErrorSeverity::Info,
            GroupBillingError::GroupNotFound { .. }
            | GroupBillingError::EnrollmentNotFound { .. }
            | GroupBillingError::InvoiceNotFound { .. }
            | GroupBillingError::NoPendingEnrollments { .. } => ErrorSeverity::Info,
            GroupBillingError::Provider(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Message safe to show to the person who triggered the request
    pub fn user_message(&self) -> String {
        match self {
            GroupBillingError::InvalidInput(msg)
            | GroupBillingError::PermissionDenied(msg)
            | GroupBillingError::Authentication(msg)
            | GroupBillingError::Duplicate(msg) => msg.clone(),
            GroupBillingError::GroupNotFound { .. } => "Group not found.".to_string(),
            GroupBillingError::EnrollmentNotFound { .. } => "Enrollment not found.".to_string(),
            GroupBillingError::InvoiceNotFound { .. } => "Invoice not found.".to_string(),
            GroupBillingError::NoPendingEnrollments { .. } => {
                "No pending enrollments to checkout.".to_string()
            }
            GroupBillingError::Provider(_) | GroupBillingError::Http(_) => {
                "An external service is unavailable. Please try again later.".to_string()
            }
            _ => "An unexpected error occurred.".to_string(),
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
    fn test_soft_failures_are_not_critical() {
        let dup = GroupBillingError::Duplicate("already enrolled".to_string());
        assert_eq!(dup.severity(), ErrorSeverity::Info);
        assert!(!dup.is_recoverable());

        let missing = GroupBillingError::GroupNotFound { group_id: 7 };
        assert_eq!(missing.severity(), ErrorSeverity::Info);
        assert_eq!(missing.user_message(), "Group not found.");
    }

    #[test]
    fn test_provider_errors_are_recoverable() {
        let err: GroupBillingError = ProviderError::Timeout.into();
        assert!(err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.user_message().contains("external service"));
    }

    #[test]
    fn test_validation_message_is_surfaced_verbatim() {
        let err = GroupBillingError::InvalidInput("Group name is required.".to_string());
        assert_eq!(err.user_message(), "Group name is required.");
        assert_eq!(err.to_string(), "Invalid input: Group name is required.");
    }
}
