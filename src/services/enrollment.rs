//! Enrollment ledger service
//!
//! Records enrollments made on behalf of a group, mirrors them to the
//! learning platform and keeps the per-enrollment reporting fees.

use std::sync::Arc;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use crate::config::EnrollmentConfig;
use crate::database::repositories::{EnrollmentRepository, GroupRepository};
use crate::models::enrollment::{
    CreateEnrollmentRequest, Enrollment, EnrollmentOutcome, EnrollmentStatus, FeeLineItem, UnenrollTarget,
};
use crate::models::CourseRef;
use crate::services::providers::{CatalogProvider, CourseEnrollmentProvider};
use crate::utils::errors::{GroupBillingError, ProviderError, Result};
use crate::utils::helpers::sanitize_text;
use crate::utils::logging::{log_enrollment_event, log_provider_failure};

const DEFAULT_FEE_LABEL: &str = "Reporting fee";

#[derive(Clone)]
pub struct EnrollmentService {
    enrollment_repository: EnrollmentRepository,
    group_repository: GroupRepository,
    catalog: Arc<dyn CatalogProvider>,
    lms: Arc<dyn CourseEnrollmentProvider>,
    config: EnrollmentConfig,
}

impl EnrollmentService {
    pub fn new(
        enrollment_repository: EnrollmentRepository,
        group_repository: GroupRepository,
        catalog: Arc<dyn CatalogProvider>,
        lms: Arc<dyn CourseEnrollmentProvider>,
        config: EnrollmentConfig,
    ) -> Self {
        Self {
            enrollment_repository,
            group_repository,
            catalog,
            lms,
            config,
        }
    }

    /// Enroll a user in a course version on behalf of a group.
    ///
    /// The course price is snapshotted onto the row. The row is written as
    /// pending, the learning platform is asked to grant access, then the row
    /// becomes active.
    pub async fn enroll(
        &self,
        group_id: i64,
        user_id: i64,
        course_id: i64,
        course_version: i32,
        enrolled_by: i64,
    ) -> Result<EnrollmentOutcome> {
        if group_id <= 0 || user_id <= 0 || course_id <= 0 || course_version < 1 {
            return Err(GroupBillingError::InvalidInput("Invalid parameters.".to_string()));
        }

        debug!(group_id = group_id, user_id = user_id, course_id = course_id, course_version = course_version, "Enrolling user");

        let group = self
            .group_repository
            .find_by_id(group_id)
            .await?
            .ok_or(GroupBillingError::GroupNotFound { group_id })?;
        if !group.is_active() {
            return Err(GroupBillingError::InvalidInput("This group is no longer active.".to_string()));
        }

        if self
            .enrollment_repository
            .find_live(group_id, user_id, course_id, course_version)
            .await?
            .is_some()
        {
            return Err(GroupBillingError::Duplicate(
                "User is already enrolled in this course version.".to_string(),
            ));
        }

        let course_price = self.get_course_price(course_id).await?;

        let pending = self
            .enrollment_repository
            .create(CreateEnrollmentRequest {
                group_id,
                user_id,
                course_id,
                course_version,
                enrolled_by,
                course_price,
            })
            .await?;

        let course = CourseRef { course_id, version: course_version };
        let provider_warning = match self.lms.enroll_user(user_id, course).await {
            Ok(()) => None,
            Err(e) if self.config.abort_on_provider_failure => {
                log_provider_failure("lms", "enroll_user", &e.to_string());
                self.enrollment_repository.delete_pending(pending.id).await?;
                return Err(e.into());
            }
            Err(e) => {
                log_provider_failure("lms", "enroll_user", &e.to_string());
                Some(format!("Learning platform did not confirm access: {}", e))
            }
        };

        let enrollment = self
            .enrollment_repository
            .set_status(pending.id, EnrollmentStatus::Active)
            .await?;

        log_enrollment_event(enrollment.id, group_id, "enrolled", provider_warning.as_deref());
        Ok(EnrollmentOutcome { enrollment, provider_warning })
    }

    /// Cancel an enrollment and revoke course access.
    ///
    /// Returns `false` when there was nothing to cancel. The order linkage of
    /// an already settled enrollment is left as it is.
    pub async fn unenroll(&self, group_id: i64, target: UnenrollTarget) -> Result<bool> {
        let enrollment = match target {
            UnenrollTarget::ById(enrollment_id) => {
                let enrollment = self
                    .enrollment_repository
                    .find_by_id(enrollment_id)
                    .await?
                    .filter(|e| e.group_id == group_id)
                    .ok_or(GroupBillingError::EnrollmentNotFound { enrollment_id })?;

                if enrollment.status == EnrollmentStatus::Cancelled {
                    debug!(enrollment_id = enrollment_id, "Enrollment already cancelled");
                    return Ok(false);
                }
                enrollment
            }
            UnenrollTarget::Latest { user_id, course_id } => {
                match self
                    .enrollment_repository
                    .find_latest_active(group_id, user_id, course_id)
                    .await?
                {
                    Some(enrollment) => enrollment,
                    None => {
                        debug!(group_id = group_id, user_id = user_id, course_id = course_id, "No active enrollment to cancel");
                        return Ok(false);
                    }
                }
            }
        };

        let cancelled = self
            .enrollment_repository
            .set_status(enrollment.id, EnrollmentStatus::Cancelled)
            .await?;

        self.revoke_access(&cancelled).await;

        if cancelled.order_id.is_some() {
            warn!(enrollment_id = cancelled.id, order_id = cancelled.order_id, "Cancelled an enrollment that was already billed");
        }
        log_enrollment_event(cancelled.id, group_id, "cancelled", None);
        Ok(true)
    }

    /// Best effort: unenroll, falling back to a progress reset when the platform cannot unenroll
    async fn revoke_access(&self, enrollment: &Enrollment) {
        let course = CourseRef {
            course_id: enrollment.course_id,
            version: enrollment.course_version,
        };

        match self.lms.unenroll_user(enrollment.user_id, course).await {
            Ok(()) => {}
            Err(ProviderError::Unsupported(_)) => {
                if let Err(e) = self.lms.reset_progress(enrollment.user_id, course).await {
                    log_provider_failure("lms", "reset_progress", &e.to_string());
                }
            }
            Err(e) => log_provider_failure("lms", "unenroll_user", &e.to_string()),
        }
    }

    /// Active enrollments of the group not yet settled by an order, oldest first
    pub async fn get_pending_enrollments(&self, group_id: i64) -> Result<Vec<Enrollment>> {
        self.enrollment_repository.get_pending(group_id).await
    }

    /// All enrollments of the group, newest first
    pub async fn get_group_enrollments(&self, group_id: i64, status: Option<EnrollmentStatus>) -> Result<Vec<Enrollment>> {
        self.enrollment_repository.list_for_group(group_id, status).await
    }

    pub async fn get_enrollment(&self, enrollment_id: i64) -> Result<Option<Enrollment>> {
        self.enrollment_repository.find_by_id(enrollment_id).await
    }

    /// Add a reporting fee to an enrollment.
    ///
    /// Non-positive amounts are ignored and reported as success.
    pub async fn record_fee(&self, enrollment_id: i64, amount: Decimal, label: &str) -> Result<bool> {
        if amount <= Decimal::ZERO {
            debug!(enrollment_id = enrollment_id, amount = %amount, "Ignoring non-positive reporting fee");
            return Ok(true);
        }

        let label = match sanitize_text(label) {
            l if l.is_empty() => DEFAULT_FEE_LABEL.to_string(),
            l => l,
        };
        let item = FeeLineItem {
            label,
            amount: amount.round_dp(2),
            recorded_at: Utc::now(),
        };

        if !self.enrollment_repository.append_fee(enrollment_id, &item).await? {
            return Err(GroupBillingError::EnrollmentNotFound { enrollment_id });
        }

        info!(enrollment_id = enrollment_id, amount = %item.amount, "Reporting fee recorded");
        Ok(true)
    }

    /// Current catalog price of a course, zero when it has no priced product
    pub async fn get_course_price(&self, course_id: i64) -> Result<Decimal> {
        let price = self.catalog.price_of(course_id).await?;
        Ok(price.max(Decimal::ZERO).round_dp(2))
    }
}
