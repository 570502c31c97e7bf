//! Checkout handlers
//!
//! Called by the storefront adapter around cart, checkout and order events.

use tracing::info;
use crate::models::{Cart, CompletedOrder, GroupCheckoutPreparation, GroupCheckoutSummary, PaymentDecision, ReconciliationOutcome};
use crate::services::{CommerceEngine, ServiceFactory};
use crate::utils::errors::GroupBillingError;
use super::{require_group_admin, require_ids, verify_request, ActionResponse, RequestContext};

/// Load a group's pending enrollments into the administrator's cart
pub async fn handle_group_checkout(
    services: &ServiceFactory,
    ctx: &RequestContext,
    group_id: i64,
    commerce: &dyn CommerceEngine,
) -> ActionResponse<GroupCheckoutPreparation> {
    let result = async {
        let admin_id = verify_request(services, ctx)?;
        require_ids(&[group_id])?;
        services.checkout_service.prepare_group_checkout(admin_id, group_id, commerce).await
    }
    .await;

    match result {
        Ok(preparation) if preparation.added == 0 => {
            let message = preparation
                .errors
                .first()
                .cloned()
                .unwrap_or_else(|| "No courses could be added to the cart.".to_string());
            ActionResponse {
                success: false,
                message,
                data: Some(preparation),
            }
        }
        Ok(preparation) => {
            let message = format!("{} course(s) added to the cart.", preparation.added);
            ActionResponse::ok(message, preparation)
        }
        Err(e) => ActionResponse::from_error(&e),
    }
}

/// Pending enrollments and running total of a group the caller administers
pub async fn handle_group_summary(services: &ServiceFactory, ctx: &RequestContext, group_id: i64) -> ActionResponse<GroupCheckoutSummary> {
    let result = async {
        let admin_id = verify_request(services, ctx)?;
        require_ids(&[group_id])?;
        require_group_admin(services, group_id, admin_id).await?;
        services.checkout_service.group_summary(group_id).await
    }
    .await;

    ActionResponse::from_result(result, "")
}

/// Decide how the cart is paid while the checkout page is built
pub async fn handle_cart_review(
    services: &ServiceFactory,
    purchaser_id: Option<i64>,
    cart: &Cart,
    commerce: &dyn CommerceEngine,
) -> ActionResponse<PaymentDecision> {
    let result = async {
        let decision = services.checkout_service.evaluate_payment(purchaser_id, cart).await?;
        services.checkout_service.apply_payment_decision(decision, commerce).await?;
        Ok::<_, GroupBillingError>(decision)
    }
    .await;

    ActionResponse::from_result(result, "")
}

/// Validate the checkout form before the order is placed
pub async fn handle_checkout_submit(
    services: &ServiceFactory,
    purchaser_id: Option<i64>,
    cart: &Cart,
    consent_given: bool,
    commerce: &dyn CommerceEngine,
) -> ActionResponse<PaymentDecision> {
    let result = async {
        let decision = services.checkout_service.validate_checkout(purchaser_id, cart, consent_given).await?;
        services.checkout_service.apply_payment_decision(decision, commerce).await?;
        Ok::<_, GroupBillingError>(decision)
    }
    .await;

    ActionResponse::from_result(result, "")
}

/// Reconcile a completed order
pub async fn handle_order_completed(
    services: &ServiceFactory,
    order: &CompletedOrder,
    commerce: &dyn CommerceEngine,
) -> ActionResponse<ReconciliationOutcome> {
    let result = services.checkout_service.on_order_completed(order, commerce).await;
    if let Ok(outcome) = &result {
        info!(order_id = order.id, outcome = ?outcome, "Order reconciled");
    }
    ActionResponse::from_result(result, "")
}
