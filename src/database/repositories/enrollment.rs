//! Enrollment repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::enrollment::{Enrollment, EnrollmentStatus, FeeLineItem, CreateEnrollmentRequest};
use crate::utils::errors::GroupBillingError;

#[derive(Debug, Clone)]
pub struct EnrollmentRepository {
    pool: PgPool,
}

impl EnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending enrollment.
    ///
    /// A live row for the same (group, user, course, version) makes the
    /// partial unique index reject the insert; that is reported as `Duplicate`.
    pub async fn create(&self, request: CreateEnrollmentRequest) -> Result<Enrollment, GroupBillingError> {
        let result = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO group_enrollments (group_id, user_id, course_id, course_version, enrolled_by, enrolled_at, status, course_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, group_id, user_id, course_id, course_version, enrolled_by, enrolled_at, status, order_id, course_price, reporting_fee_total, reporting_fee_details
            "#
        )
        .bind(request.group_id)
        .bind(request.user_id)
        .bind(request.course_id)
        .bind(request.course_version)
        .bind(request.enrolled_by)
        .bind(Utc::now())
        .bind(EnrollmentStatus::Pending)
        .bind(request.course_price)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(enrollment) => Ok(enrollment),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(GroupBillingError::Duplicate(
                    "User is already enrolled in this course version.".to_string()
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find enrollment by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Enrollment>, GroupBillingError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT id, group_id, user_id, course_id, course_version, enrolled_by, enrolled_at, status, order_id, course_price, reporting_fee_total, reporting_fee_details FROM group_enrollments WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    /// Non-cancelled enrollment for the exact tuple, if any
    pub async fn find_live(&self, group_id: i64, user_id: i64, course_id: i64, course_version: i32) -> Result<Option<Enrollment>, GroupBillingError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, group_id, user_id, course_id, course_version, enrolled_by, enrolled_at, status, order_id, course_price, reporting_fee_total, reporting_fee_details
            FROM group_enrollments
            WHERE group_id = $1 AND user_id = $2 AND course_id = $3 AND course_version = $4 AND status <> 'cancelled'
            LIMIT 1
            "#
        )
        .bind(group_id)
        .bind(user_id)
        .bind(course_id)
        .bind(course_version)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    /// Most recent active enrollment for a user and course in a group
    pub async fn find_latest_active(&self, group_id: i64, user_id: i64, course_id: i64) -> Result<Option<Enrollment>, GroupBillingError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, group_id, user_id, course_id, course_version, enrolled_by, enrolled_at, status, order_id, course_price, reporting_fee_total, reporting_fee_details
            FROM group_enrollments
            WHERE group_id = $1 AND user_id = $2 AND course_id = $3 AND status = 'active'
            ORDER BY enrolled_at DESC, id DESC
            LIMIT 1
            "#
        )
        .bind(group_id)
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    /// Update lifecycle status. Order linkage is left untouched.
    pub async fn set_status(&self, id: i64, status: EnrollmentStatus) -> Result<Enrollment, GroupBillingError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            UPDATE group_enrollments
            SET status = $2
            WHERE id = $1
            RETURNING id, group_id, user_id, course_id, course_version, enrolled_by, enrolled_at, status, order_id, course_price, reporting_fee_total, reporting_fee_details
            "#
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        enrollment.ok_or(GroupBillingError::EnrollmentNotFound { enrollment_id: id })
    }

    /// Remove a row that never left the pending state
    pub async fn delete_pending(&self, id: i64) -> Result<bool, GroupBillingError> {
        let result = sqlx::query("DELETE FROM group_enrollments WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active, unbilled enrollments of a group, oldest first
    pub async fn get_pending(&self, group_id: i64) -> Result<Vec<Enrollment>, GroupBillingError> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, group_id, user_id, course_id, course_version, enrolled_by, enrolled_at, status, order_id, course_price, reporting_fee_total, reporting_fee_details
            FROM group_enrollments
            WHERE group_id = $1 AND status = 'active' AND order_id IS NULL
            ORDER BY enrolled_at ASC, id ASC
            "#
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    /// Enrollments of a group, newest first, optionally filtered by status
    pub async fn list_for_group(&self, group_id: i64, status: Option<EnrollmentStatus>) -> Result<Vec<Enrollment>, GroupBillingError> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, group_id, user_id, course_id, course_version, enrolled_by, enrolled_at, status, order_id, course_price, reporting_fee_total, reporting_fee_details
            FROM group_enrollments
            WHERE group_id = $1 AND ($2::enrollment_status IS NULL OR status = $2)
            ORDER BY enrolled_at DESC, id DESC
            "#
        )
        .bind(group_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    /// Append a fee line item and bump the running fee total in one statement
    pub async fn append_fee(&self, id: i64, item: &FeeLineItem) -> Result<bool, GroupBillingError> {
        let line = serde_json::to_value(vec![item])?;
        let result = sqlx::query(
            r#"
            UPDATE group_enrollments
            SET reporting_fee_total = reporting_fee_total + $2,
                reporting_fee_details = reporting_fee_details || $3::jsonb
            WHERE id = $1
            "#
        )
        .bind(id)
        .bind(item.amount)
        .bind(line)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
