//! Commerce-side models: carts, completed orders and product references

use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;

/// Order metadata keys written when an order is reconciled against a group
pub mod meta_keys {
    pub const GROUP_ID: &str = "group_id";
    pub const GROUP_ORDER: &str = "group_order";
    pub const GROUP_ADMIN_CHECKOUT: &str = "group_admin_checkout";
}

/// A purchasable product in the host catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRef {
    pub product_id: i64,
    /// Set for variant products
    pub variation_id: Option<i64>,
}

impl ProductRef {
    pub fn simple(product_id: i64) -> Self {
        Self { product_id, variation_id: None }
    }

    /// The most specific product id: the variation when present
    pub fn effective_id(&self) -> i64 {
        match self.variation_id {
            Some(variation_id) if variation_id > 0 => variation_id,
            _ => self.product_id,
        }
    }
}

/// A specific version of a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseRef {
    pub course_id: i64,
    pub version: i32,
}

/// Group data attached to a cart item / order line when an administrator
/// checks out specific pending enrollments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupItemMeta {
    pub enrollment_id: Option<i64>,
    pub group_id: Option<i64>,
    pub course_id: Option<i64>,
}

impl GroupItemMeta {
    pub fn for_enrollment(enrollment_id: i64, group_id: i64, course_id: i64) -> Self {
        Self {
            enrollment_id: Some(enrollment_id),
            group_id: Some(group_id),
            course_id: Some(course_id),
        }
    }

    /// Both the enrollment and the group are present
    pub fn settlement_target(&self) -> Option<(i64, i64)> {
        match (self.enrollment_id, self.group_id) {
            (Some(enrollment_id), Some(group_id)) => Some((group_id, enrollment_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: ProductRef,
    pub quantity: u32,
    #[serde(default)]
    pub group_meta: GroupItemMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub item_id: i64,
    pub product: ProductRef,
    #[serde(default)]
    pub group_meta: GroupItemMeta,
}

/// An order the commerce engine has finished processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedOrder {
    pub id: i64,
    /// `None` for guest checkouts
    pub purchaser_id: Option<i64>,
    pub items: Vec<OrderLineItem>,
}

/// Whether the purchaser pays for the cart or it is billed to a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaymentDecision {
    /// Normal payment flow
    Required,
    /// Cart total forced to zero; value goes to the group's running total
    BilledToGroup { group_id: i64 },
}

impl PaymentDecision {
    pub fn is_bypassed(&self) -> bool {
        matches!(self, PaymentDecision::BilledToGroup { .. })
    }
}

/// What `on_order_completed` did with an order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReconciliationOutcome {
    /// Administrator settled curated pending enrollments
    AdminSettlement { group_id: i64, invoice_id: i64, enrollment_ids: Vec<i64> },
    /// The group's administrator bought courses; settled on the spot
    AdminSelfPurchase { group_id: i64, invoice_id: Option<i64>, enrollment_ids: Vec<i64> },
    /// A member bought courses; they stay pending for the administrator
    MemberDeferred { group_id: i64, enrollment_ids: Vec<i64> },
    /// No group logic applied
    PassThrough,
}

/// Result of loading a group's pending enrollments into the cart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupCheckoutPreparation {
    pub added: usize,
    pub errors: Vec<String>,
}

/// Line shown on the group checkout summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingLine {
    pub enrollment_id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub course_version: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCheckoutSummary {
    pub group_id: i64,
    pub group_name: String,
    pub lines: Vec<PendingLine>,
    pub total: Decimal,
}
