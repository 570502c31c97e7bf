//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod group;
pub mod enrollment;
pub mod invoice;

// Re-export repositories
pub use group::GroupRepository;
pub use enrollment::EnrollmentRepository;
pub use invoice::InvoiceRepository;
