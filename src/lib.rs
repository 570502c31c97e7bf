//! Group Billing
//!
//! Group administration and deferred invoicing for course enrollments.
//! A group administrator manages a roster of members, enrolls them in paid
//! courses and settles the accumulated running total in one checkout.
//! This library provides the registry, enrollment ledger, invoice ledger and
//! checkout reconciliation on top of the host platform's storefront,
//! learning platform and identity system.

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{GroupBillingError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::{Providers, ServiceFactory};
pub use handlers::{ActionResponse, RequestContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
