//! Test context for unified test setup
//!
//! Builds a migrated database, in-memory collaborators and the full
//! service factory on top of them.

use std::sync::Arc;

use group_billing::config::{EnrollmentConfig, Settings};
use group_billing::database::DatabaseService;
use group_billing::models::{Group, ProductRef};
use group_billing::services::{Providers, ServiceFactory};
use group_billing::RequestContext;

use super::database_helper::TestDatabase;
use super::fakes::{FakeCatalog, FakeIdentity, FakeLms};

pub const TEST_TOKEN_SECRET: &str = "integration-test-secret-0123456789";

/// Unified test context that manages all test components
pub struct TestContext {
    pub database: TestDatabase,
    pub services: ServiceFactory,
    pub catalog: Arc<FakeCatalog>,
    pub lms: Arc<FakeLms>,
    pub identity: Arc<FakeIdentity>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::new_with_config(EnrollmentConfig::default()).await
    }

    pub async fn new_with_config(enrollment: EnrollmentConfig) -> Self {
        let database = TestDatabase::new().await.expect("Failed to set up test database");

        let mut settings = Settings::default();
        settings.database.url = database.database_url.clone();
        settings.auth.token_secret = TEST_TOKEN_SECRET.to_string();
        settings.enrollment = enrollment;

        let catalog = Arc::new(FakeCatalog::default());
        let lms = Arc::new(FakeLms::default());
        let identity = Arc::new(FakeIdentity::default());
        let providers = Providers {
            catalog: catalog.clone(),
            lms: lms.clone(),
            identity: identity.clone(),
        };

        let services = ServiceFactory::new(settings, DatabaseService::new(database.pool.clone()), providers);

        Self {
            database,
            services,
            catalog,
            lms,
            identity,
        }
    }

    /// Request context for a signed-in user with a fresh token
    pub fn request_as(&self, user_id: i64) -> RequestContext {
        RequestContext::new(user_id, self.services.anti_forgery.issue(user_id))
    }

    /// Create a group administered by `admin` with the given active members
    pub async fn group_with_members(&self, name: &str, admin: i64, members: &[i64]) -> Group {
        let group = self
            .services
            .group_service
            .create_group(name, Some(admin))
            .await
            .expect("Failed to create group");
        for member in members {
            self.services
                .group_service
                .add_member(group.id, *member, admin)
                .await
                .expect("Failed to add member");
        }
        group
    }

    /// Register a course in the fake catalog; the product id is `course_id + 1000`
    pub fn course(&self, course_id: i64, price: rust_decimal::Decimal) -> ProductRef {
        self.catalog.add_course(course_id, course_id + 1000, price);
        ProductRef::simple(course_id + 1000)
    }
}
