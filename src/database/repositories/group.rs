//! Group repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::group::{Group, GroupStatus, GroupMember, MemberStatus, CreateGroupRequest, AddMemberRequest};
use crate::utils::errors::GroupBillingError;

#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new group owned by its administrator
    pub async fn create(&self, request: CreateGroupRequest) -> Result<Group, GroupBillingError> {
        let now = Utc::now();
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (name, admin_user_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, admin_user_id, status, created_at, updated_at
            "#
        )
        .bind(request.name)
        .bind(request.admin_user_id)
        .bind(GroupStatus::Active)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    /// Find group by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Group>, GroupBillingError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, name, admin_user_id, status, created_at, updated_at FROM groups WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Flip group status; groups are never hard-deleted
    pub async fn set_status(&self, id: i64, status: GroupStatus) -> Result<Option<Group>, GroupBillingError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET status = $2,
                updated_at = $3
            WHERE id = $1
            RETURNING id, name, admin_user_id, status, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Active groups administered by a user
    pub async fn list_by_admin(&self, admin_user_id: i64) -> Result<Vec<Group>, GroupBillingError> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, name, admin_user_id, status, created_at, updated_at FROM groups WHERE admin_user_id = $1 AND status = 'active' ORDER BY name ASC, id ASC"
        )
        .bind(admin_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    /// Active groups the user is an active member of
    pub async fn get_user_groups(&self, user_id: i64) -> Result<Vec<Group>, GroupBillingError> {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT g.id, g.name, g.admin_user_id, g.status, g.created_at, g.updated_at
            FROM groups g
            INNER JOIN group_members gm ON g.id = gm.group_id
            WHERE gm.user_id = $1 AND gm.status = 'active' AND g.status = 'active'
            ORDER BY g.name ASC, g.id ASC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    /// All active groups
    pub async fn get_active_groups(&self) -> Result<Vec<Group>, GroupBillingError> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, name, admin_user_id, status, created_at, updated_at FROM groups WHERE status = 'active' ORDER BY name ASC, id ASC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    /// Add member to group, reactivating an earlier row for the same user
    pub async fn upsert_member(&self, request: AddMemberRequest) -> Result<GroupMember, GroupBillingError> {
        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            INSERT INTO group_members (group_id, user_id, added_by, added_at, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (group_id, user_id)
            DO UPDATE SET status = EXCLUDED.status, added_by = EXCLUDED.added_by
            RETURNING id, group_id, user_id, added_by, added_at, status
            "#
        )
        .bind(request.group_id)
        .bind(request.user_id)
        .bind(request.added_by)
        .bind(Utc::now())
        .bind(MemberStatus::Active)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    /// Deactivate a membership. Returns the number of rows touched.
    pub async fn deactivate_member(&self, group_id: i64, user_id: i64) -> Result<u64, GroupBillingError> {
        let result = sqlx::query("UPDATE group_members SET status = $3 WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .bind(MemberStatus::Inactive)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Get group members, optionally filtered by status
    pub async fn get_members(&self, group_id: i64, status: Option<MemberStatus>) -> Result<Vec<GroupMember>, GroupBillingError> {
        let members = sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT id, group_id, user_id, added_by, added_at, status
            FROM group_members
            WHERE group_id = $1 AND ($2::member_status IS NULL OR status = $2)
            ORDER BY user_id ASC
            "#
        )
        .bind(group_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Check if user is an active member of group
    pub async fn is_active_member(&self, group_id: i64, user_id: i64) -> Result<bool, GroupBillingError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM group_members WHERE group_id = $1 AND user_id = $2 AND status = 'active'"
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }

    /// Check if user administers the (active) group
    pub async fn is_admin(&self, group_id: i64, user_id: i64) -> Result<bool, GroupBillingError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM groups WHERE id = $1 AND admin_user_id = $2 AND status = 'active'"
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }
}
