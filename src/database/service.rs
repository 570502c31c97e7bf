//! Database service layer
//!
//! This module bundles the repositories behind one cloneable handle

use crate::database::{DatabasePool, GroupRepository, EnrollmentRepository, InvoiceRepository};
use crate::utils::errors::GroupBillingError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub groups: GroupRepository,
    pub enrollments: EnrollmentRepository,
    pub invoices: InvoiceRepository,
    pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            groups: GroupRepository::new(pool.clone()),
            enrollments: EnrollmentRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Underlying pool, for health checks and migrations
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Check that the database answers
    pub async fn health_check(&self) -> Result<(), GroupBillingError> {
        super::connection::health_check(&self.pool).await
    }
}
