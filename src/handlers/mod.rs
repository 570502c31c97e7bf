//! Request handlers module
//!
//! Entry points called by the host adapter for each user action:
//! - Group handlers for creating groups and managing members
//! - Enrollment handlers for enrolling, unenrolling and recording fees
//! - Checkout handlers for group checkout and order reconciliation
//! - Search handlers for the user and course pickers
//!
//! Every handler returns an `ActionResponse`; errors never cross this boundary.

pub mod checkout;
pub mod enrollments;
pub mod groups;
pub mod search;

pub use checkout::*;
pub use enrollments::*;
pub use groups::*;
pub use search::*;

use serde::Serialize;
use tracing::{debug, error, warn};
use crate::services::ServiceFactory;
use crate::utils::errors::{ErrorSeverity, GroupBillingError, Result};

pub const INVALID_PARAMETERS: &str = "Invalid parameters.";
pub const PERMISSION_DENIED: &str = "Permission denied.";
pub const NOT_LOGGED_IN: &str = "You must be logged in.";
pub const SECURITY_CHECK_FAILED: &str = "Security check failed. Please refresh the page and try again.";

/// Caller identity as seen by the host adapter
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// `None` when nobody is signed in
    pub user_id: Option<i64>,
    /// Anti-forgery token sent with the request
    pub token: Option<String>,
}

impl RequestContext {
    pub fn new(user_id: i64, token: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Structured result of a user action
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ActionResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Convert an error into a failure response, logging it at its severity
    pub fn from_error(err: &GroupBillingError) -> Self {
        match err.severity() {
            ErrorSeverity::Info => debug!(error = %err, "Action rejected"),
            ErrorSeverity::Warning => warn!(error = %err, "Action failed"),
            ErrorSeverity::Error | ErrorSeverity::Critical => error!(error = %err, "Action failed"),
        }
        Self::fail(err.user_message())
    }

    pub fn from_result(result: Result<T>, success_message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self::ok(success_message, data),
            Err(e) => Self::from_error(&e),
        }
    }
}

/// Require a signed-in caller with a valid anti-forgery token. Returns the caller's id.
pub fn verify_request(services: &ServiceFactory, ctx: &RequestContext) -> Result<i64> {
    let user_id = ctx
        .user_id
        .ok_or_else(|| GroupBillingError::Authentication(NOT_LOGGED_IN.to_string()))?;

    let token = ctx.token.as_deref().unwrap_or_default();
    if !services.anti_forgery.verify(user_id, token) {
        return Err(GroupBillingError::Authentication(SECURITY_CHECK_FAILED.to_string()));
    }

    Ok(user_id)
}

/// Require the caller to administer the group
pub async fn require_group_admin(services: &ServiceFactory, group_id: i64, user_id: i64) -> Result<()> {
    if !services.group_service.is_admin(group_id, user_id).await? {
        return Err(GroupBillingError::PermissionDenied(PERMISSION_DENIED.to_string()));
    }
    Ok(())
}

/// Reject non-positive ids
pub fn require_ids(ids: &[i64]) -> Result<()> {
    if ids.iter().any(|id| *id <= 0) {
        return Err(GroupBillingError::InvalidInput(INVALID_PARAMETERS.to_string()));
    }
    Ok(())
}
