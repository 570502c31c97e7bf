//! Group and member registry service
//!
//! Creates groups, maintains their membership and answers the
//! admin/member questions the other services ask.

use tracing::{debug, info};
use crate::database::repositories::GroupRepository;
use crate::models::group::{AddMemberRequest, CreateGroupRequest, Group, GroupMember, GroupStatus, MemberStatus};
use crate::utils::errors::{GroupBillingError, Result};
use crate::utils::helpers::{sanitize_text, truncate_text};
use crate::utils::logging::log_group_event;

const MAX_GROUP_NAME_CHARS: usize = 255;

#[derive(Debug, Clone)]
pub struct GroupService {
    group_repository: GroupRepository,
}

impl GroupService {
    pub fn new(group_repository: GroupRepository) -> Self {
        Self { group_repository }
    }

    /// Create a group administered by `admin_user_id`.
    ///
    /// `None` means nobody is signed in.
    pub async fn create_group(&self, name: &str, admin_user_id: Option<i64>) -> Result<Group> {
        let admin_user_id = admin_user_id.ok_or_else(|| {
            GroupBillingError::Authentication("You must be logged in to create a group.".to_string())
        })?;

        let name = sanitize_text(name);
        if name.is_empty() {
            return Err(GroupBillingError::InvalidInput("Group name is required.".to_string()));
        }

        let group = self
            .group_repository
            .create(CreateGroupRequest {
                name: truncate_text(&name, MAX_GROUP_NAME_CHARS),
                admin_user_id,
            })
            .await?;

        log_group_event(group.id, "created", None, Some(admin_user_id));
        Ok(group)
    }

    /// Add a member, or reactivate one who was removed earlier
    pub async fn add_member(&self, group_id: i64, user_id: i64, added_by: i64) -> Result<GroupMember> {
        debug!(group_id = group_id, user_id = user_id, "Adding group member");
        self.require_group(group_id).await?;

        let member = self
            .group_repository
            .upsert_member(AddMemberRequest { group_id, user_id, added_by })
            .await?;

        log_group_event(group_id, "member_added", Some(user_id), Some(added_by));
        Ok(member)
    }

    /// Mark a member inactive. Removing someone who is not a member is not an error.
    pub async fn remove_member(&self, group_id: i64, user_id: i64) -> Result<()> {
        let affected = self.group_repository.deactivate_member(group_id, user_id).await?;
        if affected > 0 {
            log_group_event(group_id, "member_removed", Some(user_id), None);
        } else {
            debug!(group_id = group_id, user_id = user_id, "No active membership to remove");
        }
        Ok(())
    }

    pub async fn is_admin(&self, group_id: i64, user_id: i64) -> Result<bool> {
        self.group_repository.is_admin(group_id, user_id).await
    }

    pub async fn is_active_member(&self, group_id: i64, user_id: i64) -> Result<bool> {
        self.group_repository.is_active_member(group_id, user_id).await
    }

    /// Active groups the user administers, by name
    pub async fn list_groups_administered_by(&self, user_id: i64) -> Result<Vec<Group>> {
        self.group_repository.list_by_admin(user_id).await
    }

    /// Active groups the user is an active member of, by name
    pub async fn list_groups_user_belongs_to(&self, user_id: i64) -> Result<Vec<Group>> {
        self.group_repository.get_user_groups(user_id).await
    }

    pub async fn get_group(&self, group_id: i64) -> Result<Option<Group>> {
        self.group_repository.find_by_id(group_id).await
    }

    /// Group by id, failing with `GroupNotFound`
    pub async fn require_group(&self, group_id: i64) -> Result<Group> {
        self.group_repository
            .find_by_id(group_id)
            .await?
            .ok_or(GroupBillingError::GroupNotFound { group_id })
    }

    pub async fn list_members(&self, group_id: i64, status: Option<MemberStatus>) -> Result<Vec<GroupMember>> {
        self.group_repository.get_members(group_id, status).await
    }

    /// Soft-delete a group. Its enrollments and invoices are kept.
    pub async fn deactivate_group(&self, group_id: i64) -> Result<Group> {
        let group = self
            .group_repository
            .set_status(group_id, GroupStatus::Inactive)
            .await?
            .ok_or(GroupBillingError::GroupNotFound { group_id })?;

        info!(group_id = group_id, "Group deactivated");
        Ok(group)
    }

    /// All active groups
    pub async fn active_groups(&self) -> Result<Vec<Group>> {
        self.group_repository.get_active_groups().await
    }
}
