//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for group billing.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{GroupBillingError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard must be kept alive for the lifetime of the process,
/// otherwise buffered file output is lost.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| GroupBillingError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log group and membership changes
pub fn log_group_event(group_id: i64, event: &str, user_id: Option<i64>, actor_id: Option<i64>) {
    info!(
        group_id = group_id,
        event = event,
        user_id = user_id,
        actor_id = actor_id,
        "Group event occurred"
    );
}

/// Log enrollment lifecycle changes
pub fn log_enrollment_event(enrollment_id: i64, group_id: i64, event: &str, details: Option<&str>) {
    info!(
        enrollment_id = enrollment_id,
        group_id = group_id,
        event = event,
        details = details,
        "Enrollment event occurred"
    );
}

/// Log invoice creation and payment
pub fn log_invoice_event(invoice_id: i64, group_id: i64, event: &str, total: Decimal, order_id: Option<i64>) {
    info!(
        invoice_id = invoice_id,
        group_id = group_id,
        event = event,
        total = %total,
        order_id = order_id,
        "Invoice event occurred"
    );
}

/// Log a failed call to an external collaborator that the operation tolerated
pub fn log_provider_failure(provider: &str, operation: &str, error: &str) {
    warn!(
        provider = provider,
        operation = operation,
        error = error,
        "External provider call failed"
    );
}

/// Log which reconciliation branch an order took
pub fn log_checkout_branch(order_id: i64, branch: &str, group_id: Option<i64>) {
    debug!(
        order_id = order_id,
        branch = branch,
        group_id = group_id,
        "Checkout reconciliation branch selected"
    );
}
