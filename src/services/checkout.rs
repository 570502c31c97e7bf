//! Checkout reconciliation
//!
//! Decides at checkout time whether a cart is paid by the purchaser or
//! billed to their group, and at order completion which enrollments are
//! created, linked to the order and invoiced.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::models::group::Group;
use crate::models::order::meta_keys;
use crate::models::{
    Cart, CompletedOrder, CourseRef, GroupCheckoutPreparation, GroupCheckoutSummary, GroupItemMeta,
    OrderLineItem, PaymentDecision, PendingLine, ProductRef, ReconciliationOutcome,
};
use crate::services::enrollment::EnrollmentService;
use crate::services::group::GroupService;
use crate::services::invoice::{running_total, InvoiceService};
use crate::services::providers::{CatalogProvider, CommerceEngine};
use crate::utils::errors::{GroupBillingError, Result};
use crate::utils::logging::{log_checkout_branch, log_provider_failure};

pub const CONSENT_REQUIRED_MESSAGE: &str =
    "Please confirm that this order will be billed to your group administrator.";

#[derive(Clone)]
pub struct CheckoutService {
    groups: GroupService,
    enrollments: EnrollmentService,
    invoices: InvoiceService,
    catalog: Arc<dyn CatalogProvider>,
}

impl CheckoutService {
    pub fn new(
        groups: GroupService,
        enrollments: EnrollmentService,
        invoices: InvoiceService,
        catalog: Arc<dyn CatalogProvider>,
    ) -> Self {
        Self {
            groups,
            enrollments,
            invoices,
            catalog,
        }
    }

    /// Decide whether the purchaser pays for `cart`.
    ///
    /// The cart is billed to the group when the purchaser is an active member
    /// of a group and every item resolves to a course. The group administrator
    /// always pays, both for their own courses and for settlement carts.
    pub async fn evaluate_payment(&self, purchaser_id: Option<i64>, cart: &Cart) -> Result<PaymentDecision> {
        let Some(purchaser_id) = purchaser_id else {
            return Ok(PaymentDecision::Required);
        };
        if cart.items.is_empty() {
            return Ok(PaymentDecision::Required);
        }
        if cart.items.iter().any(|item| item.group_meta.settlement_target().is_some()) {
            return Ok(PaymentDecision::Required);
        }

        let Some(group) = self.primary_group(purchaser_id).await? else {
            return Ok(PaymentDecision::Required);
        };
        if group.admin_user_id == purchaser_id {
            return Ok(PaymentDecision::Required);
        }

        for item in &cart.items {
            if self.resolve_course(item.product).await.is_none() {
                debug!(product_id = item.product.effective_id(), "Cart holds a non-course product, payment required");
                return Ok(PaymentDecision::Required);
            }
        }

        Ok(PaymentDecision::BilledToGroup { group_id: group.id })
    }

    /// Zero the cart and hide payment methods when the order is billed to a group
    pub async fn apply_payment_decision(&self, decision: PaymentDecision, commerce: &dyn CommerceEngine) -> Result<()> {
        if let PaymentDecision::BilledToGroup { group_id } = decision {
            commerce.force_zero_total().await?;
            commerce.suppress_payment_methods().await?;
            debug!(group_id = group_id, "Payment bypassed for group order");
        }
        Ok(())
    }

    /// Gate order finalization: a group-billed order needs the purchaser's consent
    pub async fn validate_checkout(&self, purchaser_id: Option<i64>, cart: &Cart, consent_given: bool) -> Result<PaymentDecision> {
        let decision = self.evaluate_payment(purchaser_id, cart).await?;
        if decision.is_bypassed() && !consent_given {
            return Err(GroupBillingError::InvalidInput(CONSENT_REQUIRED_MESSAGE.to_string()));
        }
        Ok(decision)
    }

    /// Reconcile a completed order against the purchaser's group
    pub async fn on_order_completed(&self, order: &CompletedOrder, commerce: &dyn CommerceEngine) -> Result<ReconciliationOutcome> {
        if let Some((group_id, enrollment_ids)) = admin_settlement_targets(&order.items) {
            return self.settle_admin_checkout(order, group_id, enrollment_ids, commerce).await;
        }

        let Some(purchaser_id) = order.purchaser_id else {
            log_checkout_branch(order.id, "pass_through", None);
            return Ok(ReconciliationOutcome::PassThrough);
        };
        let Some(group) = self.primary_group(purchaser_id).await? else {
            log_checkout_branch(order.id, "pass_through", None);
            return Ok(ReconciliationOutcome::PassThrough);
        };

        let is_admin = group.admin_user_id == purchaser_id;
        log_checkout_branch(
            order.id,
            if is_admin { "admin_self_purchase" } else { "member_deferred" },
            Some(group.id),
        );

        let enrollment_ids = self.enroll_purchased_courses(order, &group, purchaser_id).await?;
        self.tag_order(commerce, order.id, group.id, false).await;

        if !is_admin {
            info!(order_id = order.id, group_id = group.id, count = enrollment_ids.len(), "Member purchase deferred to group");
            return Ok(ReconciliationOutcome::MemberDeferred {
                group_id: group.id,
                enrollment_ids,
            });
        }

        let invoice_id = if enrollment_ids.is_empty() {
            None
        } else {
            let invoice = self
                .invoices
                .settle_enrollments(group.id, order.id, &enrollment_ids, Some(format!("Administrator purchase, order #{}", order.id)))
                .await?;
            Some(invoice.id)
        };

        Ok(ReconciliationOutcome::AdminSelfPurchase {
            group_id: group.id,
            invoice_id,
            enrollment_ids,
        })
    }

    async fn settle_admin_checkout(
        &self,
        order: &CompletedOrder,
        group_id: i64,
        enrollment_ids: Vec<i64>,
        commerce: &dyn CommerceEngine,
    ) -> Result<ReconciliationOutcome> {
        log_checkout_branch(order.id, "admin_settlement", Some(group_id));

        let is_admin = match order.purchaser_id {
            Some(purchaser_id) => self.groups.is_admin(group_id, purchaser_id).await?,
            None => false,
        };
        if !is_admin {
            warn!(
                order_id = order.id,
                group_id = group_id,
                purchaser_id = order.purchaser_id,
                "Order carries group settlement data but was not placed by the group administrator"
            );
            return Ok(ReconciliationOutcome::PassThrough);
        }

        self.tag_order(commerce, order.id, group_id, true).await;

        let invoice = match self
            .invoices
            .settle_enrollments(group_id, order.id, &enrollment_ids, Some(format!("Group checkout, order #{}", order.id)))
            .await
        {
            Ok(invoice) => invoice,
            Err(GroupBillingError::NoPendingEnrollments { .. }) => {
                warn!(order_id = order.id, group_id = group_id, "Referenced enrollments were already settled");
                return Ok(ReconciliationOutcome::PassThrough);
            }
            Err(e) => return Err(e),
        };

        info!(order_id = order.id, group_id = group_id, invoice_id = invoice.id, total = %invoice.total_amount, "Group invoice settled");
        Ok(ReconciliationOutcome::AdminSettlement {
            group_id,
            invoice_id: invoice.id,
            enrollment_ids,
        })
    }

    /// Enroll the purchaser in every course the order contains. Returns the new enrollment ids.
    ///
    /// A provider failure fails the whole reconciliation. Lines enrolled before
    /// the failure are kept and skipped as duplicates when the order is replayed.
    async fn enroll_purchased_courses(&self, order: &CompletedOrder, group: &Group, purchaser_id: i64) -> Result<Vec<i64>> {
        let mut enrollment_ids = Vec::new();

        for item in &order.items {
            let course = match self.catalog.course_for_product(item.product).await {
                Ok(Some(course)) => course,
                Ok(None) => continue,
                Err(e) => {
                    error!(
                        order_id = order.id,
                        product_id = item.product.effective_id(),
                        error = %e,
                        "Could not resolve purchased product, reconciliation failed"
                    );
                    return Err(e.into());
                }
            };

            match self
                .enrollments
                .enroll(group.id, purchaser_id, course.course_id, course.version, purchaser_id)
                .await
            {
                Ok(outcome) => enrollment_ids.push(outcome.enrollment.id),
                Err(GroupBillingError::Duplicate(_)) => {
                    debug!(order_id = order.id, course_id = course.course_id, "Purchaser already enrolled, skipping");
                }
                Err(GroupBillingError::Provider(e)) => {
                    error!(
                        order_id = order.id,
                        group_id = group.id,
                        user_id = purchaser_id,
                        course_id = course.course_id,
                        error = %e,
                        "Could not enroll purchased course, reconciliation failed"
                    );
                    return Err(GroupBillingError::Provider(e));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(enrollment_ids)
    }

    /// Load every pending enrollment of the group into the administrator's cart
    pub async fn prepare_group_checkout(&self, admin_id: i64, group_id: i64, commerce: &dyn CommerceEngine) -> Result<GroupCheckoutPreparation> {
        if !self.groups.is_admin(group_id, admin_id).await? {
            return Err(GroupBillingError::PermissionDenied("Permission denied.".to_string()));
        }

        let pending = self.enrollments.get_pending_enrollments(group_id).await?;
        if pending.is_empty() {
            return Err(GroupBillingError::NoPendingEnrollments { group_id });
        }

        commerce.empty_cart().await?;

        let mut preparation = GroupCheckoutPreparation::default();
        for enrollment in &pending {
            let product = match self.catalog.purchasable_product_for(enrollment.course_id).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    preparation.errors.push(format!("Could not find product for course: Course #{}", enrollment.course_id));
                    continue;
                }
                Err(e) => {
                    log_provider_failure("catalog", "purchasable_product_for", &e.to_string());
                    preparation.errors.push(format!("Could not find product for course: Course #{}", enrollment.course_id));
                    continue;
                }
            };

            let meta = GroupItemMeta::for_enrollment(enrollment.id, group_id, enrollment.course_id);
            match commerce.add_to_cart(product, meta).await {
                Ok(true) => preparation.added += 1,
                Ok(false) => {
                    preparation.errors.push(format!("Could not add course to cart: Course #{}", enrollment.course_id));
                }
                Err(e) => {
                    log_provider_failure("commerce", "add_to_cart", &e.to_string());
                    preparation.errors.push(format!("Could not add course to cart: Course #{}", enrollment.course_id));
                }
            }
        }

        info!(group_id = group_id, added = preparation.added, failed = preparation.errors.len(), "Group checkout prepared");
        Ok(preparation)
    }

    /// Pending enrollments and running total of a group, for display
    pub async fn group_summary(&self, group_id: i64) -> Result<GroupCheckoutSummary> {
        let group = self.groups.require_group(group_id).await?;
        let pending = self.enrollments.get_pending_enrollments(group_id).await?;

        Ok(GroupCheckoutSummary {
            group_id,
            group_name: group.name,
            total: running_total(&pending),
            lines: pending
                .iter()
                .map(|e| PendingLine {
                    enrollment_id: e.id,
                    user_id: e.user_id,
                    course_id: e.course_id,
                    course_version: e.course_version,
                    price: e.course_price,
                })
                .collect(),
        })
    }

    /// First group the user belongs to, by name
    async fn primary_group(&self, user_id: i64) -> Result<Option<Group>> {
        Ok(self.groups.list_groups_user_belongs_to(user_id).await?.into_iter().next())
    }

    /// Course granted by a product; catalog failures count as "not a course"
    async fn resolve_course(&self, product: ProductRef) -> Option<CourseRef> {
        match self.catalog.course_for_product(product).await {
            Ok(course) => course,
            Err(e) => {
                log_provider_failure("catalog", "course_for_product", &e.to_string());
                None
            }
        }
    }

    /// Tag a reconciled order. Failures are logged; the reconciliation stands.
    async fn tag_order(&self, commerce: &dyn CommerceEngine, order_id: i64, group_id: i64, admin_checkout: bool) {
        let mut meta = vec![
            (meta_keys::GROUP_ID, group_id.to_string()),
            (meta_keys::GROUP_ORDER, "yes".to_string()),
        ];
        if admin_checkout {
            meta.push((meta_keys::GROUP_ADMIN_CHECKOUT, "yes".to_string()));
        }

        for (key, value) in meta {
            if let Err(e) = commerce.set_order_meta(order_id, key, &value).await {
                log_provider_failure("commerce", "set_order_meta", &e.to_string());
            }
        }
    }
}

/// Group and enrollment ids referenced by settlement line items.
///
/// Only the first referenced group is settled; lines pointing at another
/// group are ignored.
pub fn admin_settlement_targets(items: &[OrderLineItem]) -> Option<(i64, Vec<i64>)> {
    let mut targets = items.iter().filter_map(|item| item.group_meta.settlement_target());
    let (group_id, first) = targets.next()?;

    let mut enrollment_ids = vec![first];
    for (other_group, enrollment_id) in targets {
        if other_group != group_id {
            warn!(group_id = group_id, other_group = other_group, enrollment_id = enrollment_id, "Ignoring line for a different group");
            continue;
        }
        if !enrollment_ids.contains(&enrollment_id) {
            enrollment_ids.push(enrollment_id);
        }
    }

    Some((group_id, enrollment_ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item_id: i64, meta: GroupItemMeta) -> OrderLineItem {
        OrderLineItem {
            item_id,
            product: ProductRef::simple(500 + item_id),
            group_meta: meta,
        }
    }

    #[test]
    fn test_no_settlement_lines() {
        let items = vec![line(1, GroupItemMeta::default())];
        assert_eq!(admin_settlement_targets(&items), None);
    }

    #[test]
    fn test_settlement_lines_are_collected() {
        let items = vec![
            line(1, GroupItemMeta::for_enrollment(11, 3, 100)),
            line(2, GroupItemMeta::default()),
            line(3, GroupItemMeta::for_enrollment(12, 3, 101)),
            line(4, GroupItemMeta::for_enrollment(11, 3, 100)),
        ];
        assert_eq!(admin_settlement_targets(&items), Some((3, vec![11, 12])));
    }

    #[test]
    fn test_lines_for_other_groups_are_ignored() {
        let items = vec![
            line(1, GroupItemMeta::for_enrollment(11, 3, 100)),
            line(2, GroupItemMeta::for_enrollment(21, 4, 100)),
        ];
        assert_eq!(admin_settlement_targets(&items), Some((3, vec![11])));
    }

    #[test]
    fn test_incomplete_meta_is_not_a_settlement() {
        let meta = GroupItemMeta {
            enrollment_id: Some(11),
            group_id: None,
            course_id: Some(100),
        };
        assert_eq!(admin_settlement_targets(&[line(1, meta)]), None);
    }
}
