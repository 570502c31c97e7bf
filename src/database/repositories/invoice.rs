//! Invoice repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::invoice::{Invoice, InvoiceStatus, CreateInvoiceRequest};
use crate::utils::errors::GroupBillingError;

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an invoice and, when an order is given, link the invoiced
    /// enrollments to that order.
    ///
    /// Both happen in one transaction. If any enrollment was linked by
    /// someone else in the meantime nothing is written.
    pub async fn create_and_link(&self, request: CreateInvoiceRequest) -> Result<Invoice, GroupBillingError> {
        let now = Utc::now();
        let (status, paid_date) = match request.order_id {
            Some(_) => (InvoiceStatus::Paid, Some(now)),
            None => (InvoiceStatus::Pending, None),
        };

        let mut tx = self.pool.begin().await?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO group_invoices (group_id, order_id, total_amount, status, invoice_date, paid_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, group_id, order_id, total_amount, status, invoice_date, paid_date, notes
            "#
        )
        .bind(request.group_id)
        .bind(request.order_id)
        .bind(request.total_amount)
        .bind(status)
        .bind(now)
        .bind(paid_date)
        .bind(request.notes)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(order_id) = request.order_id {
            let linked = sqlx::query(
                r#"
                UPDATE group_enrollments
                SET order_id = $1
                WHERE id = ANY($2) AND group_id = $3 AND order_id IS NULL AND status = 'active'
                "#
            )
            .bind(order_id)
            .bind(&request.enrollment_ids)
            .bind(request.group_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if linked != request.enrollment_ids.len() as u64 {
                tx.rollback().await?;
                return Err(GroupBillingError::Duplicate(
                    "Some enrollments were already settled by another order.".to_string()
                ));
            }
        }

        tx.commit().await?;
        Ok(invoice)
    }

    /// Find invoice by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>, GroupBillingError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT id, group_id, order_id, total_amount, status, invoice_date, paid_date, notes FROM group_invoices WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Invoices of a group, newest first
    pub async fn list_for_group(&self, group_id: i64) -> Result<Vec<Invoice>, GroupBillingError> {
        let invoices = sqlx::query_as::<_, Invoice>(
            "SELECT id, group_id, order_id, total_amount, status, invoice_date, paid_date, notes FROM group_invoices WHERE group_id = $1 ORDER BY invoice_date DESC, id DESC"
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Mark invoice as paid, optionally recording the settling order
    pub async fn mark_paid(&self, id: i64, order_id: Option<i64>) -> Result<Option<Invoice>, GroupBillingError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE group_invoices
            SET status = $2,
                paid_date = $3,
                order_id = COALESCE($4, order_id)
            WHERE id = $1
            RETURNING id, group_id, order_id, total_amount, status, invoice_date, paid_date, notes
            "#
        )
        .bind(id)
        .bind(InvoiceStatus::Paid)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }
}
