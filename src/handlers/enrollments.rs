//! Enrollment handlers

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use crate::models::enrollment::{Enrollment, EnrollmentOutcome, UnenrollTarget};
use crate::models::invoice::Invoice;
use crate::services::ServiceFactory;
use crate::utils::errors::{GroupBillingError, Result};
use super::{require_group_admin, require_ids, verify_request, ActionResponse, RequestContext, INVALID_PARAMETERS};

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollParams {
    pub group_id: i64,
    pub user_id: i64,
    pub course_id: i64,
    /// Defaults to the configured course version
    pub course_version: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnenrollParams {
    pub group_id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub enrollment_id: Option<i64>,
}

/// Enroll a member of a group the caller administers
pub async fn handle_enroll(services: &ServiceFactory, ctx: &RequestContext, params: EnrollParams) -> ActionResponse<Enrollment> {
    match enroll(services, ctx, &params).await {
        Ok(EnrollmentOutcome { enrollment, provider_warning: Some(warning) }) => {
            ActionResponse::ok(format!("User enrolled successfully. {}", warning), enrollment)
        }
        Ok(EnrollmentOutcome { enrollment, provider_warning: None }) => {
            ActionResponse::ok("User enrolled successfully.", enrollment)
        }
        Err(e) => ActionResponse::from_error(&e),
    }
}

async fn enroll(services: &ServiceFactory, ctx: &RequestContext, params: &EnrollParams) -> Result<EnrollmentOutcome> {
    let admin_id = verify_request(services, ctx)?;
    require_ids(&[params.group_id, params.user_id, params.course_id])?;
    let course_version = params
        .course_version
        .unwrap_or(services.settings.enrollment.default_course_version);

    require_group_admin(services, params.group_id, admin_id).await?;

    if !services.group_service.is_active_member(params.group_id, params.user_id).await? {
        return Err(GroupBillingError::InvalidInput("User is not a member of this group.".to_string()));
    }

    services
        .enrollment_service
        .enroll(params.group_id, params.user_id, params.course_id, course_version, admin_id)
        .await
}

/// Cancel an enrollment in a group the caller administers
pub async fn handle_unenroll(services: &ServiceFactory, ctx: &RequestContext, params: UnenrollParams) -> ActionResponse<bool> {
    let result = async {
        let admin_id = verify_request(services, ctx)?;
        require_ids(&[params.group_id])?;
        require_group_admin(services, params.group_id, admin_id).await?;

        let target = match params.enrollment_id {
            Some(enrollment_id) if enrollment_id > 0 => UnenrollTarget::ById(enrollment_id),
            _ => {
                require_ids(&[params.user_id, params.course_id])?;
                UnenrollTarget::Latest {
                    user_id: params.user_id,
                    course_id: params.course_id,
                }
            }
        };

        let cancelled = services.enrollment_service.unenroll(params.group_id, target).await?;
        if !cancelled {
            return Err(GroupBillingError::InvalidInput("No active enrollment found.".to_string()));
        }
        info!(group_id = params.group_id, admin_id = admin_id, "Enrollment cancelled via handler");
        Ok::<bool, GroupBillingError>(cancelled)
    }
    .await;

    ActionResponse::from_result(result, "User unenrolled successfully.")
}

/// Record a reporting fee against an enrollment of a group the caller administers
pub async fn handle_record_fee(
    services: &ServiceFactory,
    ctx: &RequestContext,
    enrollment_id: i64,
    amount: &str,
    label: &str,
) -> ActionResponse<bool> {
    let result = async {
        let admin_id = verify_request(services, ctx)?;
        require_ids(&[enrollment_id])?;
        let amount: Decimal = amount
            .trim()
            .parse()
            .map_err(|_| GroupBillingError::InvalidInput(INVALID_PARAMETERS.to_string()))?;

        let enrollment = services
            .enrollment_service
            .get_enrollment(enrollment_id)
            .await?
            .ok_or(GroupBillingError::EnrollmentNotFound { enrollment_id })?;
        require_group_admin(services, enrollment.group_id, admin_id).await?;

        services.enrollment_service.record_fee(enrollment_id, amount, label).await
    }
    .await;

    ActionResponse::from_result(result, "Fee recorded.")
}

/// Every enrollment of a group the caller administers, newest first
pub async fn handle_group_enrollments(services: &ServiceFactory, ctx: &RequestContext, group_id: i64) -> ActionResponse<Vec<Enrollment>> {
    let result = async {
        let admin_id = verify_request(services, ctx)?;
        require_ids(&[group_id])?;
        require_group_admin(services, group_id, admin_id).await?;
        services.enrollment_service.get_group_enrollments(group_id, None).await
    }
    .await;

    ActionResponse::from_result(result, "")
}

/// Invoices of a group the caller administers, newest first
pub async fn handle_group_invoices(services: &ServiceFactory, ctx: &RequestContext, group_id: i64) -> ActionResponse<Vec<Invoice>> {
    let result = async {
        let admin_id = verify_request(services, ctx)?;
        require_ids(&[group_id])?;
        require_group_admin(services, group_id, admin_id).await?;
        services.invoice_service.list_invoices(group_id).await
    }
    .await;

    ActionResponse::from_result(result, "")
}
