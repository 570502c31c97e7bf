//! Running totals and the invoice ledger

use std::collections::HashSet;
use rust_decimal::Decimal;
use tracing::debug;
use crate::database::repositories::{EnrollmentRepository, InvoiceRepository};
use crate::models::enrollment::Enrollment;
use crate::models::invoice::{CreateInvoiceRequest, Invoice};
use crate::utils::errors::{GroupBillingError, Result};
use crate::utils::helpers::sum_prices;
use crate::utils::logging::log_invoice_event;

#[derive(Debug, Clone)]
pub struct InvoiceService {
    invoice_repository: InvoiceRepository,
    enrollment_repository: EnrollmentRepository,
}

impl InvoiceService {
    pub fn new(invoice_repository: InvoiceRepository, enrollment_repository: EnrollmentRepository) -> Self {
        Self {
            invoice_repository,
            enrollment_repository,
        }
    }

    /// Sum of the snapshotted prices of the group's pending enrollments
    pub async fn calculate_running_total(&self, group_id: i64) -> Result<Decimal> {
        let pending = self.enrollment_repository.get_pending(group_id).await?;
        let total = running_total(&pending);
        debug!(group_id = group_id, pending = pending.len(), total = %total, "Calculated running total");
        Ok(total)
    }

    /// Freeze every pending enrollment of the group into an invoice.
    ///
    /// With an order the invoice is created paid and the enrollments are
    /// linked to that order, so they leave the running total.
    pub async fn create_invoice(&self, group_id: i64, order_id: Option<i64>) -> Result<Invoice> {
        let pending = self.enrollment_repository.get_pending(group_id).await?;
        self.invoice_enrollments(group_id, order_id, pending, None).await
    }

    /// Invoice only the listed enrollments, skipping any that are no longer pending
    pub async fn settle_enrollments(&self, group_id: i64, order_id: i64, enrollment_ids: &[i64], notes: Option<String>) -> Result<Invoice> {
        let wanted: HashSet<i64> = enrollment_ids.iter().copied().collect();
        let pending: Vec<Enrollment> = self
            .enrollment_repository
            .get_pending(group_id)
            .await?
            .into_iter()
            .filter(|e| wanted.contains(&e.id))
            .collect();

        if pending.len() < wanted.len() {
            debug!(
                group_id = group_id,
                requested = wanted.len(),
                pending = pending.len(),
                "Some requested enrollments are no longer pending"
            );
        }

        self.invoice_enrollments(group_id, Some(order_id), pending, notes).await
    }

    async fn invoice_enrollments(
        &self,
        group_id: i64,
        order_id: Option<i64>,
        enrollments: Vec<Enrollment>,
        notes: Option<String>,
    ) -> Result<Invoice> {
        if enrollments.is_empty() {
            return Err(GroupBillingError::NoPendingEnrollments { group_id });
        }

        let request = CreateInvoiceRequest {
            group_id,
            order_id,
            total_amount: running_total(&enrollments),
            enrollment_ids: enrollments.iter().map(|e| e.id).collect(),
            notes,
        };

        let invoice = self.invoice_repository.create_and_link(request).await?;
        log_invoice_event(invoice.id, group_id, "created", invoice.total_amount, order_id);
        Ok(invoice)
    }

    /// Mark an invoice paid, optionally recording the order that paid it
    pub async fn mark_paid(&self, invoice_id: i64, order_id: Option<i64>) -> Result<Invoice> {
        let invoice = self
            .invoice_repository
            .mark_paid(invoice_id, order_id)
            .await?
            .ok_or(GroupBillingError::InvoiceNotFound { invoice_id })?;

        log_invoice_event(invoice.id, invoice.group_id, "paid", invoice.total_amount, invoice.order_id);
        Ok(invoice)
    }

    pub async fn get_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>> {
        self.invoice_repository.find_by_id(invoice_id).await
    }

    /// Invoices of a group, newest first
    pub async fn list_invoices(&self, group_id: i64) -> Result<Vec<Invoice>> {
        self.invoice_repository.list_for_group(group_id).await
    }
}

/// Total of the snapshotted prices; cancelled and already billed rows do not count
pub fn running_total(enrollments: &[Enrollment]) -> Decimal {
    sum_prices(enrollments.iter().filter(|e| e.is_pending()).map(|e| e.course_price))
}
