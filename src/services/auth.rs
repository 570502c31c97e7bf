//! Authorization and anti-forgery checks
//!
//! Decides who may create and manage groups, and issues the signed tokens
//! that state-changing actions must present.

use std::collections::HashSet;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};
use crate::config::AuthConfig;
use crate::services::providers::IdentityProvider;
use crate::utils::logging::log_provider_failure;

type HmacSha256 = Hmac<Sha256>;

/// Who may create and manage groups
#[async_trait]
pub trait AuthorizationPolicy: Send + Sync {
    async fn can_manage_group(&self, user_id: i64) -> bool;
}

/// Grants management to holders of a configured role or of the per-user override flag
pub struct ManagerRolePolicy {
    identity: Arc<dyn IdentityProvider>,
    manager_roles: HashSet<String>,
}

impl ManagerRolePolicy {
    pub fn new(identity: Arc<dyn IdentityProvider>, config: &AuthConfig) -> Self {
        Self {
            identity,
            manager_roles: config.manager_roles.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl AuthorizationPolicy for ManagerRolePolicy {
    async fn can_manage_group(&self, user_id: i64) -> bool {
        debug!(user_id = user_id, "Checking group management permission");

        match self.identity.roles_of(user_id).await {
            Ok(roles) if roles.iter().any(|role| self.manager_roles.contains(role)) => return true,
            Ok(_) => {}
            Err(e) => log_provider_failure("identity", "roles_of", &e.to_string()),
        }

        match self.identity.has_group_manager_flag(user_id).await {
            Ok(flag) => flag,
            Err(e) => {
                log_provider_failure("identity", "has_group_manager_flag", &e.to_string());
                false
            }
        }
    }
}

/// Issues and verifies per-user request tokens.
///
/// A token is `"<issued_at>.<hex hmac>"` where the MAC covers the user id
/// and the issue timestamp.
#[derive(Clone)]
pub struct AntiForgery {
    secret: Vec<u8>,
    ttl_seconds: i64,
}

impl AntiForgery {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.token_secret.as_bytes().to_vec(),
            ttl_seconds: config.token_ttl_seconds,
        }
    }

    /// Issue a token for the user, valid from now
    pub fn issue(&self, user_id: i64) -> String {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: i64, issued_at: i64) -> String {
        let signature = self
            .mac(user_id, issued_at)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default();
        format!("{}.{}", issued_at, signature)
    }

    /// Check a token presented by the user
    pub fn verify(&self, user_id: i64, token: &str) -> bool {
        self.verify_at(user_id, token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, user_id: i64, token: &str, now: i64) -> bool {
        let Some((issued_at, signature)) = token.split_once('.') else {
            return false;
        };
        let Ok(issued_at) = issued_at.parse::<i64>() else {
            return false;
        };
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };

        let Some(age) = now.checked_sub(issued_at) else {
            return false;
        };
        if age < 0 || age > self.ttl_seconds {
            warn!(user_id = user_id, age = age, "Rejected expired or future-dated token");
            return false;
        }

        self.mac(user_id, issued_at)
            .map_or(false, |mac| mac.verify_slice(&signature).is_ok())
    }

    fn mac(&self, user_id: i64, issued_at: i64) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(format!("{}:{}", user_id, issued_at).as_bytes());
        Some(mac)
    }
}

impl std::fmt::Debug for AntiForgery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AntiForgery")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}
