//! User and course search for the admin pickers

use crate::models::SearchResult;
use crate::services::ServiceFactory;
use crate::utils::errors::{GroupBillingError, Result};
use super::{verify_request, ActionResponse, RequestContext, PERMISSION_DENIED};

async fn authorize_search(services: &ServiceFactory, ctx: &RequestContext, term: &str) -> Result<String> {
    let user_id = verify_request(services, ctx)?;
    if !services.authorization.can_manage_group(user_id).await {
        return Err(GroupBillingError::PermissionDenied(PERMISSION_DENIED.to_string()));
    }

    let term = term.trim();
    let min = services.settings.search.min_query_length;
    if term.chars().count() < min {
        return Err(GroupBillingError::InvalidInput(format!("Please enter at least {} characters.", min)));
    }
    Ok(term.to_string())
}

/// Users matching `term`, shown as "display name (email)"
pub async fn search_users(services: &ServiceFactory, ctx: &RequestContext, term: &str) -> ActionResponse<Vec<SearchResult>> {
    let result = async {
        let term = authorize_search(services, ctx, term).await?;
        let limit = services.settings.search.max_results;
        let users = services.providers.identity.search_users(&term, limit).await?;
        Ok::<_, GroupBillingError>(users.into_iter().take(limit).map(SearchResult::from).collect())
    }
    .await;

    ActionResponse::from_result(result, "")
}

/// Published courses matching `term`
pub async fn search_courses(services: &ServiceFactory, ctx: &RequestContext, term: &str) -> ActionResponse<Vec<SearchResult>> {
    let result = async {
        let term = authorize_search(services, ctx, term).await?;
        let limit = services.settings.search.max_results;
        let courses = services.providers.catalog.search_courses(&term, limit).await?;
        Ok::<_, GroupBillingError>(courses.into_iter().take(limit).map(SearchResult::from).collect())
    }
    .await;

    ActionResponse::from_result(result, "")
}
