//! In-memory host platform collaborators
//!
//! Each fake records the calls it receives so tests can assert on them.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use group_billing::models::{CourseRef, CourseSummary, GroupItemMeta, ProductRef, UserSummary};
use group_billing::services::{CatalogProvider, CommerceEngine, CourseEnrollmentProvider, IdentityProvider};
use group_billing::utils::errors::{ProviderError, ProviderResult};

/// Catalog with courses registered by the test
#[derive(Default)]
pub struct FakeCatalog {
    prices: Mutex<HashMap<i64, Decimal>>,
    products: Mutex<HashMap<i64, ProductRef>>,
    bindings: Mutex<HashMap<i64, CourseRef>>,
    courses: Mutex<Vec<CourseSummary>>,
    pub unavailable: Mutex<bool>,
}

impl FakeCatalog {
    /// Register a course sold as product `product_id` granting version 1
    pub fn add_course(&self, course_id: i64, product_id: i64, price: Decimal) {
        self.add_course_version(course_id, 1, ProductRef::simple(product_id), price);
    }

    pub fn add_course_version(&self, course_id: i64, version: i32, product: ProductRef, price: Decimal) {
        self.prices.lock().unwrap().insert(course_id, price);
        self.products.lock().unwrap().insert(course_id, product);
        self.bindings
            .lock()
            .unwrap()
            .insert(product.effective_id(), CourseRef { course_id, version });
        self.courses.lock().unwrap().push(CourseSummary {
            id: course_id,
            title: format!("Course {}", course_id),
        });
    }

    pub fn set_price(&self, course_id: i64, price: Decimal) {
        self.prices.lock().unwrap().insert(course_id, price);
    }

    /// A course with no purchasable product
    pub fn remove_product(&self, course_id: i64) {
        self.products.lock().unwrap().remove(&course_id);
    }

    fn check_available(&self) -> ProviderResult<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(ProviderError::ServiceUnavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn price_of(&self, course_id: i64) -> ProviderResult<Decimal> {
        self.check_available()?;
        Ok(self.prices.lock().unwrap().get(&course_id).copied().unwrap_or(Decimal::ZERO))
    }

    async fn purchasable_product_for(&self, course_id: i64) -> ProviderResult<Option<ProductRef>> {
        self.check_available()?;
        Ok(self.products.lock().unwrap().get(&course_id).copied())
    }

    async fn course_for_product(&self, product: ProductRef) -> ProviderResult<Option<CourseRef>> {
        self.check_available()?;
        Ok(self.bindings.lock().unwrap().get(&product.effective_id()).copied())
    }

    async fn search_courses(&self, term: &str, limit: usize) -> ProviderResult<Vec<CourseSummary>> {
        self.check_available()?;
        let term = term.to_lowercase();
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.title.to_lowercase().contains(&term))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LmsCall {
    Enroll(i64, CourseRef),
    Unenroll(i64, CourseRef),
    ResetProgress(i64, CourseRef),
}

/// Learning platform that records calls
#[derive(Default)]
pub struct FakeLms {
    pub calls: Mutex<Vec<LmsCall>>,
    pub fail_enroll: Mutex<bool>,
    pub unenroll_unsupported: Mutex<bool>,
}

impl FakeLms {
    pub fn calls(&self) -> Vec<LmsCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CourseEnrollmentProvider for FakeLms {
    async fn enroll_user(&self, user_id: i64, course: CourseRef) -> ProviderResult<()> {
        self.calls.lock().unwrap().push(LmsCall::Enroll(user_id, course));
        if *self.fail_enroll.lock().unwrap() {
            return Err(ProviderError::RequestFailed("HTTP 500: enrollment failed".to_string()));
        }
        Ok(())
    }

    async fn unenroll_user(&self, user_id: i64, course: CourseRef) -> ProviderResult<()> {
        self.calls.lock().unwrap().push(LmsCall::Unenroll(user_id, course));
        if *self.unenroll_unsupported.lock().unwrap() {
            return Err(ProviderError::Unsupported("unenroll".to_string()));
        }
        Ok(())
    }

    async fn reset_progress(&self, user_id: i64, course: CourseRef) -> ProviderResult<()> {
        self.calls.lock().unwrap().push(LmsCall::ResetProgress(user_id, course));
        Ok(())
    }
}

/// Identity system with roles and flags set by the test
#[derive(Default)]
pub struct FakeIdentity {
    roles: Mutex<HashMap<i64, Vec<String>>>,
    manager_flags: Mutex<HashSet<i64>>,
    users: Mutex<Vec<UserSummary>>,
}

impl FakeIdentity {
    pub fn grant_role(&self, user_id: i64, role: &str) {
        self.roles.lock().unwrap().entry(user_id).or_default().push(role.to_string());
    }

    pub fn grant_manager_flag(&self, user_id: i64) {
        self.manager_flags.lock().unwrap().insert(user_id);
    }

    pub fn add_user(&self, id: i64, display_name: &str, email: &str) {
        self.users.lock().unwrap().push(UserSummary {
            id,
            display_name: display_name.to_string(),
            email: email.to_string(),
        });
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn roles_of(&self, user_id: i64) -> ProviderResult<Vec<String>> {
        Ok(self.roles.lock().unwrap().get(&user_id).cloned().unwrap_or_default())
    }

    async fn has_group_manager_flag(&self, user_id: i64) -> ProviderResult<bool> {
        Ok(self.manager_flags.lock().unwrap().contains(&user_id))
    }

    async fn search_users(&self, term: &str, limit: usize) -> ProviderResult<Vec<UserSummary>> {
        let term = term.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.display_name.to_lowercase().contains(&term) || u.email.to_lowercase().contains(&term))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Cart and order state of one storefront session
#[derive(Default)]
pub struct FakeCommerce {
    pub cart: Mutex<Vec<(ProductRef, GroupItemMeta)>>,
    pub order_meta: Mutex<Vec<(i64, String, String)>>,
    pub refused_products: Mutex<HashSet<i64>>,
    pub emptied: Mutex<u32>,
    pub zero_total: Mutex<bool>,
    pub payment_suppressed: Mutex<bool>,
}

impl FakeCommerce {
    pub fn meta_value(&self, order_id: i64, key: &str) -> Option<String> {
        self.order_meta
            .lock()
            .unwrap()
            .iter()
            .find(|(id, k, _)| *id == order_id && k == key)
            .map(|(_, _, v)| v.clone())
    }
}

#[async_trait]
impl CommerceEngine for FakeCommerce {
    async fn empty_cart(&self) -> ProviderResult<()> {
        self.cart.lock().unwrap().clear();
        *self.emptied.lock().unwrap() += 1;
        Ok(())
    }

    async fn add_to_cart(&self, product: ProductRef, meta: GroupItemMeta) -> ProviderResult<bool> {
        if self.refused_products.lock().unwrap().contains(&product.effective_id()) {
            return Ok(false);
        }
        self.cart.lock().unwrap().push((product, meta));
        Ok(true)
    }

    async fn force_zero_total(&self) -> ProviderResult<()> {
        *self.zero_total.lock().unwrap() = true;
        Ok(())
    }

    async fn suppress_payment_methods(&self) -> ProviderResult<()> {
        *self.payment_suppressed.lock().unwrap() = true;
        Ok(())
    }

    async fn set_order_meta(&self, order_id: i64, key: &str, value: &str) -> ProviderResult<()> {
        self.order_meta
            .lock()
            .unwrap()
            .push((order_id, key.to_string(), value.to_string()));
        Ok(())
    }
}
