//! HTTP client for the host platform API
//!
//! One client serves the catalog, learning platform and identity lookups.
//! Request failures are mapped onto `ProviderError` so callers can decide
//! whether to tolerate them.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use crate::config::HostConfig;
use crate::models::{CourseRef, CourseSummary, ProductRef, UserSummary};
use crate::services::providers::{CatalogProvider, CourseEnrollmentProvider, IdentityProvider};
use crate::utils::errors::{GroupBillingError, ProviderError, ProviderResult, Result};
use crate::utils::helpers::parse_course_binding;

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    product_id: i64,
    variation_id: Option<i64>,
    #[serde(default = "default_true")]
    purchasable: bool,
}

#[derive(Debug, Deserialize)]
struct BindingsResponse {
    #[serde(default)]
    bindings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UserRolesResponse {
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    can_manage_groups: bool,
}

#[derive(Debug, Serialize)]
struct CourseAccessRequest {
    user_id: i64,
    course_id: i64,
    version: i32,
}

fn default_true() -> bool {
    true
}

/// Client for the host platform REST API
#[derive(Debug, Clone)]
pub struct HostApiClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    default_course_version: i32,
}

impl HostApiClient {
    /// Create a new client from host settings
    pub fn new(config: &HostConfig, default_course_version: i32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("group-billing/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GroupBillingError::Http)?;

        // `Url::join` replaces the last segment unless the base ends with a slash
        let mut base_url = Url::parse(&config.api_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            default_course_version,
        })
    }

    fn endpoint(&self, path: &str) -> ProviderResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ProviderResult<Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else if e.is_connect() {
                    ProviderError::ServiceUnavailable
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })
    }

    /// GET a JSON document; `None` on 404
    async fn get_optional<T: for<'de> Deserialize<'de>>(&self, path: &str, query: &[(&str, String)]) -> ProviderResult<Option<T>> {
        let url = self.endpoint(path)?;
        debug!(url = %url, "Making host API request");

        let response = self.send(self.client.get(url).query(query)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::ensure_success(response).await?;

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn get_required<T: for<'de> Deserialize<'de>>(&self, path: &str, query: &[(&str, String)]) -> ProviderResult<T> {
        self.get_optional(path, query)
            .await?
            .ok_or_else(|| ProviderError::InvalidResponse(format!("{} returned 404", path)))
    }

    async fn post_course_access(&self, path: &str, user_id: i64, course: CourseRef) -> ProviderResult<Response> {
        let url = self.endpoint(path)?;
        debug!(url = %url, user_id = user_id, course_id = course.course_id, "Making host API request");

        let body = CourseAccessRequest {
            user_id,
            course_id: course.course_id,
            version: course.version,
        };
        self.send(self.client.post(url).json(&body)).await
    }

    async fn ensure_success(response: Response) -> ProviderResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ProviderError::ServiceUnavailable);
        }
        let error_text = response.text().await.unwrap_or_default();
        Err(ProviderError::RequestFailed(format!("HTTP {}: {}", status, error_text)))
    }
}

#[async_trait]
impl CatalogProvider for HostApiClient {
    async fn price_of(&self, course_id: i64) -> ProviderResult<Decimal> {
        let price = self
            .get_optional::<PriceResponse>(&format!("courses/{}/price", course_id), &[])
            .await?
            .map(|response| response.price)
            .unwrap_or(Decimal::ZERO);

        Ok(price.max(Decimal::ZERO))
    }

    async fn purchasable_product_for(&self, course_id: i64) -> ProviderResult<Option<ProductRef>> {
        let product = self
            .get_optional::<ProductResponse>(&format!("courses/{}/product", course_id), &[])
            .await?;

        Ok(product
            .filter(|p| p.purchasable)
            .map(|p| ProductRef {
                product_id: p.product_id,
                variation_id: p.variation_id,
            }))
    }

    async fn course_for_product(&self, product: ProductRef) -> ProviderResult<Option<CourseRef>> {
        let bindings = self
            .get_optional::<BindingsResponse>(&format!("products/{}/courses", product.effective_id()), &[])
            .await?;

        Ok(bindings.and_then(|b| {
            b.bindings
                .iter()
                .find_map(|binding| parse_course_binding(binding, self.default_course_version))
                .map(|(course_id, version)| CourseRef { course_id, version })
        }))
    }

    async fn search_courses(&self, term: &str, limit: usize) -> ProviderResult<Vec<CourseSummary>> {
        self.get_required(
            "courses",
            &[("search", term.to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}

#[async_trait]
impl CourseEnrollmentProvider for HostApiClient {
    async fn enroll_user(&self, user_id: i64, course: CourseRef) -> ProviderResult<()> {
        let response = self.post_course_access("lms/enrollments", user_id, course).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn unenroll_user(&self, user_id: i64, course: CourseRef) -> ProviderResult<()> {
        let response = self.post_course_access("lms/unenrollments", user_id, course).await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                Err(ProviderError::Unsupported("unenroll".to_string()))
            }
            _ => Self::ensure_success(response).await.map(|_| ()),
        }
    }

    async fn reset_progress(&self, user_id: i64, course: CourseRef) -> ProviderResult<()> {
        let response = self.post_course_access("lms/progress-resets", user_id, course).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for HostApiClient {
    async fn roles_of(&self, user_id: i64) -> ProviderResult<Vec<String>> {
        let roles = self
            .get_optional::<UserRolesResponse>(&format!("users/{}/roles", user_id), &[])
            .await?;
        Ok(roles.map(|r| r.roles).unwrap_or_default())
    }

    async fn has_group_manager_flag(&self, user_id: i64) -> ProviderResult<bool> {
        let roles = self
            .get_optional::<UserRolesResponse>(&format!("users/{}/roles", user_id), &[])
            .await?;
        Ok(roles.map(|r| r.can_manage_groups).unwrap_or(false))
    }

    async fn search_users(&self, term: &str, limit: usize) -> ProviderResult<Vec<UserSummary>> {
        self.get_required(
            "users",
            &[("search", term.to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}
