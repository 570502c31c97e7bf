//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod group;
pub mod enrollment;
pub mod invoice;
pub mod order;

// Re-export commonly used models
pub use user::{UserSummary, CourseSummary, SearchResult};
pub use group::{Group, GroupStatus, GroupMember, MemberStatus, CreateGroupRequest, AddMemberRequest};
pub use enrollment::{Enrollment, EnrollmentStatus, FeeLineItem, CreateEnrollmentRequest, EnrollmentOutcome, UnenrollTarget};
pub use invoice::{Invoice, InvoiceStatus, CreateInvoiceRequest};
pub use order::{
    Cart, CartItem, CompletedOrder, CourseRef, GroupCheckoutPreparation, GroupCheckoutSummary,
    GroupItemMeta, OrderLineItem, PaymentDecision, PendingLine, ProductRef, ReconciliationOutcome,
};
