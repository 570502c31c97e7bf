//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod checkout;
pub mod enrollment;
pub mod group;
pub mod host_api;
pub mod invoice;
pub mod providers;

// Re-export commonly used services
pub use auth::{AntiForgery, AuthorizationPolicy, ManagerRolePolicy};
pub use checkout::CheckoutService;
pub use enrollment::EnrollmentService;
pub use group::GroupService;
pub use host_api::HostApiClient;
pub use invoice::InvoiceService;
pub use providers::{CatalogProvider, CommerceEngine, CourseEnrollmentProvider, IdentityProvider};

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// The host platform collaborators the services talk to
#[derive(Clone)]
pub struct Providers {
    pub catalog: Arc<dyn CatalogProvider>,
    pub lms: Arc<dyn CourseEnrollmentProvider>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Providers {
    /// Use the host platform REST API for all three collaborators
    pub fn from_host_api(settings: &Settings) -> Result<Self> {
        let client = Arc::new(HostApiClient::new(&settings.host, settings.enrollment.default_course_version)?);
        Ok(Self {
            catalog: client.clone(),
            lms: client.clone(),
            identity: client,
        })
    }
}

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub group_service: GroupService,
    pub enrollment_service: EnrollmentService,
    pub invoice_service: InvoiceService,
    pub checkout_service: CheckoutService,
    pub authorization: Arc<dyn AuthorizationPolicy>,
    pub anti_forgery: AntiForgery,
    pub providers: Providers,
    pub settings: Settings,
    database: DatabaseService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: Settings, database: DatabaseService, providers: Providers) -> Self {
        let group_service = GroupService::new(database.groups.clone());
        let enrollment_service = EnrollmentService::new(
            database.enrollments.clone(),
            database.groups.clone(),
            providers.catalog.clone(),
            providers.lms.clone(),
            settings.enrollment.clone(),
        );
        let invoice_service = InvoiceService::new(database.invoices.clone(), database.enrollments.clone());
        let checkout_service = CheckoutService::new(
            group_service.clone(),
            enrollment_service.clone(),
            invoice_service.clone(),
            providers.catalog.clone(),
        );
        let authorization: Arc<dyn AuthorizationPolicy> =
            Arc::new(ManagerRolePolicy::new(providers.identity.clone(), &settings.auth));
        let anti_forgery = AntiForgery::new(&settings.auth);

        Self {
            group_service,
            enrollment_service,
            invoice_service,
            checkout_service,
            authorization,
            anti_forgery,
            providers,
            settings,
            database,
        }
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = self.database.health_check().await.is_ok();

        ServiceHealthStatus {
            database_healthy,
            abort_on_provider_failure: self.settings.enrollment.abort_on_provider_failure,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub abort_on_provider_failure: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }

        issues
    }
}
