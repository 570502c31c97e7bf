//! Enrollment model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::FromRow;

/// Lifecycle of an enrollment. Billing state is tracked separately by `order_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Active,
    Cancelled,
}

/// One reporting fee charged against an enrollment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeLineItem {
    pub label: String,
    pub amount: Decimal,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub course_version: i32,
    pub enrolled_by: i64,
    pub enrolled_at: DateTime<Utc>,
    pub status: EnrollmentStatus,
    /// `None` until the enrollment has been settled by an order
    pub order_id: Option<i64>,
    /// Price at enrollment time
    pub course_price: Decimal,
    pub reporting_fee_total: Decimal,
    pub reporting_fee_details: Json<Vec<FeeLineItem>>,
}

impl Enrollment {
    /// Counts toward the group's running total
    pub fn is_pending(&self) -> bool {
        self.status == EnrollmentStatus::Active && self.order_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub group_id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub course_version: i32,
    pub enrolled_by: i64,
    pub course_price: Decimal,
}

/// Result of a successful enroll call
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentOutcome {
    pub enrollment: Enrollment,
    /// Set when the learning platform call failed but the enrollment went ahead
    pub provider_warning: Option<String>,
}

/// How to find the enrollment an unenroll call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnenrollTarget {
    /// Explicit enrollment id; must belong to the group
    ById(i64),
    /// Most recent active enrollment for the user and course in the group
    Latest { user_id: i64, course_id: i64 },
}
