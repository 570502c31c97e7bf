//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::Path;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub host: HostConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub enrollment: EnrollmentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Host platform (catalog, learning platform, identity) API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

/// Authorization and anti-forgery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Roles whose holders may create and manage groups
    pub manager_roles: Vec<String>,
    /// Secret used to sign anti-forgery tokens
    pub token_secret: String,
    pub token_ttl_seconds: i64,
}

/// Enrollment behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrollmentConfig {
    /// Remove the pending row and fail when the learning platform rejects an enrollment.
    /// When false the enrollment proceeds and the failure is reported as a warning.
    pub abort_on_provider_failure: bool,
    pub default_course_version: i32,
}

/// Search endpoint limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub min_query_length: usize,
    pub max_results: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_name: String,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            abort_on_provider_failure: false,
            default_course_version: 1,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_length: 2,
            max_results: 20,
        }
    }
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("GROUP_BILLING").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Load settings from an explicit file, layered over the defaults
    pub fn from_file(path: &Path) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::from(path))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::GroupBillingError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        // A per-process secret; tokens do not survive a restart unless one is configured
        let token_secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();

        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/group_billing".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            host: HostConfig {
                api_url: "http://localhost:8080/api".to_string(),
                api_key: None,
                timeout_seconds: 10,
            },
            auth: AuthConfig {
                manager_roles: vec!["administrator".to_string()],
                token_secret,
                token_ttl_seconds: 43_200,
            },
            enrollment: EnrollmentConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                file_name: "group-billing.log".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.search.min_query_length, 2);
        assert_eq!(settings.search.max_results, 20);
        assert!(!settings.enrollment.abort_on_provider_failure);
        assert_eq!(settings.auth.token_secret.len(), 48);
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[database]
url = "postgresql://db.internal/billing"
max_connections = 4
min_connections = 2

[enrollment]
abort_on_provider_failure = true
default_course_version = 1
"#
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.database.url, "postgresql://db.internal/billing");
        assert_eq!(settings.database.max_connections, 4);
        assert!(settings.enrollment.abort_on_provider_failure);
        // untouched sections keep their defaults
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.search.max_results, 20);
    }
}
