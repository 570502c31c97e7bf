//! Host platform collaborator interfaces
//!
//! Group billing sits on top of a storefront (catalog, cart, orders), a
//! learning platform (course access and progress) and an identity system.
//! Each is reached through one of the traits below; implementations are
//! picked once at startup and shared behind `Arc`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use crate::models::{CourseRef, CourseSummary, GroupItemMeta, ProductRef, UserSummary};
use crate::utils::errors::ProviderResult;

/// Course pricing and product lookups
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Current price of the product linked to a course; zero when no priced product exists
    async fn price_of(&self, course_id: i64) -> ProviderResult<Decimal>;

    /// Purchasable product (simple or variant) that grants the course
    async fn purchasable_product_for(&self, course_id: i64) -> ProviderResult<Option<ProductRef>>;

    /// Course and version granted by a product, if it is a course product
    async fn course_for_product(&self, product: ProductRef) -> ProviderResult<Option<CourseRef>>;

    /// Published courses whose title matches `term`
    async fn search_courses(&self, term: &str, limit: usize) -> ProviderResult<Vec<CourseSummary>>;
}

/// Learning platform enrollment calls
#[async_trait]
pub trait CourseEnrollmentProvider: Send + Sync {
    async fn enroll_user(&self, user_id: i64, course: CourseRef) -> ProviderResult<()>;

    /// Returns `ProviderError::Unsupported` when the platform cannot remove access
    async fn unenroll_user(&self, user_id: i64, course: CourseRef) -> ProviderResult<()>;

    async fn reset_progress(&self, user_id: i64, course: CourseRef) -> ProviderResult<()>;
}

/// Identity, roles and the user directory
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn roles_of(&self, user_id: i64) -> ProviderResult<Vec<String>>;

    /// Per-user override granting group management regardless of role
    async fn has_group_manager_flag(&self, user_id: i64) -> ProviderResult<bool>;

    async fn search_users(&self, term: &str, limit: usize) -> ProviderResult<Vec<UserSummary>>;
}

/// Cart and order operations of the storefront for the current session
#[async_trait]
pub trait CommerceEngine: Send + Sync {
    async fn empty_cart(&self) -> ProviderResult<()>;

    /// Add one unit of `product` with group data attached; `false` when the cart refused it
    async fn add_to_cart(&self, product: ProductRef, meta: GroupItemMeta) -> ProviderResult<bool>;

    async fn force_zero_total(&self) -> ProviderResult<()>;

    async fn suppress_payment_methods(&self) -> ProviderResult<()>;

    async fn set_order_meta(&self, order_id: i64, key: &str, value: &str) -> ProviderResult<()>;
}
