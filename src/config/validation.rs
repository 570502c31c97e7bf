//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{GroupBillingError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_host_config(&settings.host)?;
    validate_auth_config(&settings.auth)?;
    validate_enrollment_config(&settings.enrollment)?;
    validate_search_config(&settings.search)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(GroupBillingError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(GroupBillingError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(GroupBillingError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate host platform configuration
fn validate_host_config(config: &super::HostConfig) -> Result<()> {
    if config.api_url.is_empty() {
        return Err(GroupBillingError::Config(
            "Host API URL is required".to_string()
        ));
    }

    url::Url::parse(&config.api_url)
        .map_err(|e| GroupBillingError::Config(format!("Invalid host API URL: {}", e)))?;

    if config.timeout_seconds == 0 {
        return Err(GroupBillingError::Config(
            "Host API timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate authorization configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.token_secret.len() < 16 {
        return Err(GroupBillingError::Config(
            "Token secret must be at least 16 characters".to_string()
        ));
    }

    if config.token_ttl_seconds <= 0 {
        return Err(GroupBillingError::Config(
            "Token TTL must be greater than 0".to_string()
        ));
    }

    if config.manager_roles.iter().any(|r| r.trim().is_empty()) {
        return Err(GroupBillingError::Config(
            "Manager roles cannot be blank".to_string()
        ));
    }

    Ok(())
}

/// Validate enrollment configuration
fn validate_enrollment_config(config: &super::EnrollmentConfig) -> Result<()> {
    if config.default_course_version < 1 {
        return Err(GroupBillingError::Config(
            "Default course version must be at least 1".to_string()
        ));
    }

    Ok(())
}

/// Validate search configuration
fn validate_search_config(config: &super::SearchConfig) -> Result<()> {
    if config.min_query_length == 0 {
        return Err(GroupBillingError::Config(
            "Minimum search length must be at least 1".to_string()
        ));
    }

    if config.max_results == 0 {
        return Err(GroupBillingError::Config(
            "Search result cap must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(GroupBillingError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(GroupBillingError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if config.file_name.is_empty() {
        return Err(GroupBillingError::Config(
            "Log file name is required".to_string()
        ));
    }

    Ok(())
}
