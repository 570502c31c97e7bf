//! Group and membership handlers

use tracing::{debug, info};
use crate::models::group::{Group, GroupMember, MemberStatus};
use crate::services::ServiceFactory;
use crate::utils::errors::{GroupBillingError, Result};
use super::{require_group_admin, require_ids, verify_request, ActionResponse, RequestContext, PERMISSION_DENIED};

/// Create a group administered by the caller
pub async fn handle_create_group(services: &ServiceFactory, ctx: &RequestContext, name: &str) -> ActionResponse<Group> {
    let result = create_group(services, ctx, name).await;
    ActionResponse::from_result(result, "Group created successfully.")
}

async fn create_group(services: &ServiceFactory, ctx: &RequestContext, name: &str) -> Result<Group> {
    if ctx.user_id.is_none() {
        // Let the registry report the missing session with its own message
        return services.group_service.create_group(name, None).await;
    }
    let user_id = verify_request(services, ctx)?;

    if !services.authorization.can_manage_group(user_id).await {
        return Err(GroupBillingError::PermissionDenied(PERMISSION_DENIED.to_string()));
    }

    let group = services.group_service.create_group(name, Some(user_id)).await?;
    info!(group_id = group.id, user_id = user_id, "Group created via handler");
    Ok(group)
}

/// Add a user to a group the caller administers
pub async fn handle_add_member(services: &ServiceFactory, ctx: &RequestContext, group_id: i64, user_id: i64) -> ActionResponse<GroupMember> {
    let result = async {
        let admin_id = verify_request(services, ctx)?;
        require_ids(&[group_id, user_id])?;
        require_group_admin(services, group_id, admin_id).await?;
        services.group_service.add_member(group_id, user_id, admin_id).await
    }
    .await;

    ActionResponse::from_result(result, "Member added successfully.")
}

/// Remove a user from a group the caller administers
pub async fn handle_remove_member(services: &ServiceFactory, ctx: &RequestContext, group_id: i64, user_id: i64) -> ActionResponse<()> {
    let result = async {
        let admin_id = verify_request(services, ctx)?;
        require_ids(&[group_id, user_id])?;
        require_group_admin(services, group_id, admin_id).await?;
        debug!(group_id = group_id, user_id = user_id, admin_id = admin_id, "Removing member via handler");
        services.group_service.remove_member(group_id, user_id).await
    }
    .await;

    ActionResponse::from_result(result, "Member removed successfully.")
}

/// Active members of a group the caller administers
pub async fn handle_list_members(services: &ServiceFactory, ctx: &RequestContext, group_id: i64) -> ActionResponse<Vec<GroupMember>> {
    let result = async {
        let admin_id = verify_request(services, ctx)?;
        require_ids(&[group_id])?;
        require_group_admin(services, group_id, admin_id).await?;
        services.group_service.list_members(group_id, Some(MemberStatus::Active)).await
    }
    .await;

    ActionResponse::from_result(result, "")
}

/// Groups the caller administers
pub async fn handle_my_groups(services: &ServiceFactory, ctx: &RequestContext) -> ActionResponse<Vec<Group>> {
    let result = async {
        let user_id = verify_request(services, ctx)?;
        services.group_service.list_groups_administered_by(user_id).await
    }
    .await;

    ActionResponse::from_result(result, "")
}
