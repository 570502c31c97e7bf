//! Group Billing
//!
//! Maintenance entry point: prepares the database and reports every
//! active group's running total.

use tracing::{info, warn, error};

use group_billing::{
    config::Settings,
    utils::{helpers::format_money, logging},
    database::{DatabaseService, connection::{create_pool, run_migrations, DatabaseConfig}},
    services::{Providers, ServiceFactory},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment overrides from .env, if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", group_billing::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&DatabaseConfig::from(&settings.database)).await?;

    // Run database migrations
    run_migrations(&db_pool).await?;

    let database_service = DatabaseService::new(db_pool);

    // Initialize services
    info!("Initializing services...");
    let providers = Providers::from_host_api(&settings)?;
    let services = ServiceFactory::new(settings.clone(), database_service, providers);

    let health = services.health_check().await;
    if !health.is_healthy() {
        for issue in health.get_issues() {
            error!(issue = %issue, "Service health check failed");
        }
        anyhow::bail!("service health check failed");
    }

    let groups = services.group_service.active_groups().await?;
    info!(count = groups.len(), "Active groups");

    for group in groups {
        match services.invoice_service.calculate_running_total(group.id).await {
            Ok(total) => info!(
                group_id = group.id,
                group_name = %group.name,
                admin_user_id = group.admin_user_id,
                running_total = %format_money(total),
                "Group running total"
            ),
            Err(e) => warn!(group_id = group.id, error = %e, "Failed to calculate running total"),
        }
    }

    info!("{} finished.", group_billing::NAME);
    Ok(())
}
