//! Group and member registry tests

mod helpers;

use assert_matches::assert_matches;
use helpers::*;
use serial_test::serial;

use group_billing::models::{GroupStatus, MemberStatus};
use group_billing::GroupBillingError;

#[tokio::test]
#[serial]
async fn test_create_group_requires_name_and_session() {
    let ctx = TestContext::new().await;
    let groups = &ctx.services.group_service;

    let err = groups.create_group("Acme", None).await.unwrap_err();
    assert_matches!(err, GroupBillingError::Authentication(ref msg) if msg == "You must be logged in to create a group.");

    let err = groups.create_group("   ", Some(1)).await.unwrap_err();
    assert_matches!(err, GroupBillingError::InvalidInput(ref msg) if msg == "Group name is required.");

    let group = groups.create_group("  Acme Training  ", Some(1)).await.unwrap();
    assert_eq!(group.name, "Acme Training");
    assert_eq!(group.admin_user_id, 1);
    assert_eq!(group.status, GroupStatus::Active);
}

#[tokio::test]
#[serial]
async fn test_admin_and_membership_queries() {
    let ctx = TestContext::new().await;
    let group = ctx.group_with_members("Acme", 1, &[10, 11]).await;
    let groups = &ctx.services.group_service;

    assert!(groups.is_admin(group.id, 1).await.unwrap());
    assert!(!groups.is_admin(group.id, 10).await.unwrap());
    assert!(groups.is_active_member(group.id, 10).await.unwrap());
    assert!(!groups.is_active_member(group.id, 99).await.unwrap());

    let members = groups.list_members(group.id, None).await.unwrap();
    let ids: Vec<i64> = members.iter().map(|m| m.user_id).collect();
    assert_eq!(ids, vec![10, 11]);
}

#[tokio::test]
#[serial]
async fn test_remove_then_readd_member() {
    let ctx = TestContext::new().await;
    let group = ctx.group_with_members("Acme", 1, &[10]).await;
    let groups = &ctx.services.group_service;

    groups.remove_member(group.id, 10).await.unwrap();
    assert!(!groups.is_active_member(group.id, 10).await.unwrap());
    assert!(groups.list_groups_user_belongs_to(10).await.unwrap().is_empty());

    // Removing a non-member is not an error
    groups.remove_member(group.id, 555).await.unwrap();

    let member = groups.add_member(group.id, 10, 1).await.unwrap();
    assert_eq!(member.status, MemberStatus::Active);
    assert!(groups.is_active_member(group.id, 10).await.unwrap());

    // Re-adding reuses the single (group, user) row
    let all = groups.list_members(group.id, None).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_add_member_to_missing_group() {
    let ctx = TestContext::new().await;
    let err = ctx.services.group_service.add_member(4242, 10, 1).await.unwrap_err();
    assert_matches!(err, GroupBillingError::GroupNotFound { group_id: 4242 });
}

#[tokio::test]
#[serial]
async fn test_group_listings_are_ordered_by_name() {
    let ctx = TestContext::new().await;
    let zeta = ctx.group_with_members("Zeta", 1, &[10]).await;
    let alpha = ctx.group_with_members("Alpha", 1, &[10]).await;
    ctx.group_with_members("Other admin", 2, &[]).await;

    let administered = ctx.services.group_service.list_groups_administered_by(1).await.unwrap();
    let names: Vec<&str> = administered.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);

    let belongs = ctx.services.group_service.list_groups_user_belongs_to(10).await.unwrap();
    let ids: Vec<i64> = belongs.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![alpha.id, zeta.id]);
}

#[tokio::test]
#[serial]
async fn test_deactivated_group_is_hidden() {
    let ctx = TestContext::new().await;
    let group = ctx.group_with_members("Acme", 1, &[10]).await;
    let groups = &ctx.services.group_service;

    let deactivated = groups.deactivate_group(group.id).await.unwrap();
    assert_eq!(deactivated.status, GroupStatus::Inactive);

    assert!(!groups.is_admin(group.id, 1).await.unwrap());
    assert!(groups.list_groups_administered_by(1).await.unwrap().is_empty());
    assert!(groups.list_groups_user_belongs_to(10).await.unwrap().is_empty());
    assert!(groups.get_group(group.id).await.unwrap().is_some());
}
