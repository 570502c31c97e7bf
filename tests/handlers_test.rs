//! Request handler tests: authentication, permissions and response messages

mod helpers;

use helpers::*;
use rust_decimal_macros::dec;
use serial_test::serial;

use group_billing::handlers::{self, EnrollParams, UnenrollParams};
use group_billing::RequestContext;

#[tokio::test]
#[serial]
async fn test_create_group_requires_manager() {
    let ctx = TestContext::new().await;

    let response = handlers::handle_create_group(&ctx.services, &RequestContext::anonymous(), "Acme").await;
    assert!(!response.success);
    assert_eq!(response.message, "You must be logged in to create a group.");

    let response = handlers::handle_create_group(&ctx.services, &ctx.request_as(5), "Acme").await;
    assert!(!response.success);
    assert_eq!(response.message, "Permission denied.");

    ctx.identity.grant_role(5, "administrator");
    let response = handlers::handle_create_group(&ctx.services, &ctx.request_as(5), "Acme").await;
    assert!(response.success);
    assert_eq!(response.data.unwrap().admin_user_id, 5);

    ctx.identity.grant_manager_flag(6);
    let response = handlers::handle_create_group(&ctx.services, &ctx.request_as(6), "").await;
    assert!(!response.success);
    assert_eq!(response.message, "Group name is required.");
}

#[tokio::test]
#[serial]
async fn test_bad_token_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.identity.grant_role(5, "administrator");

    let forged = RequestContext::new(5, "1700000000.deadbeef");
    let response = handlers::handle_create_group(&ctx.services, &forged, "Acme").await;
    assert!(!response.success);
    assert!(response.message.starts_with("Security check failed"));

    // A token issued to someone else does not work either
    let stolen = RequestContext::new(5, ctx.services.anti_forgery.issue(6));
    let response = handlers::handle_create_group(&ctx.services, &stolen, "Acme").await;
    assert!(!response.success);
}

#[tokio::test]
#[serial]
async fn test_member_management_requires_group_admin() {
    let ctx = TestContext::new().await;
    let group = ctx.group_with_members("Acme", 1, &[]).await;

    let response = handlers::handle_add_member(&ctx.services, &ctx.request_as(2), group.id, 10).await;
    assert!(!response.success);
    assert_eq!(response.message, "Permission denied.");

    let response = handlers::handle_add_member(&ctx.services, &ctx.request_as(1), group.id, 0).await;
    assert_eq!(response.message, "Invalid parameters.");

    let response = handlers::handle_add_member(&ctx.services, &ctx.request_as(1), group.id, 10).await;
    assert!(response.success);

    let response = handlers::handle_list_members(&ctx.services, &ctx.request_as(1), group.id).await;
    assert_eq!(response.data.unwrap().len(), 1);

    let response = handlers::handle_remove_member(&ctx.services, &ctx.request_as(1), group.id, 10).await;
    assert!(response.success);
    let response = handlers::handle_list_members(&ctx.services, &ctx.request_as(1), group.id).await;
    assert!(response.data.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_enroll_handler_checks_membership() {
    let ctx = TestContext::new().await;
    let group = ctx.group_with_members("Acme", 1, &[10]).await;
    ctx.course(100, dec!(25.00));

    let params = |user_id| EnrollParams {
        group_id: group.id,
        user_id,
        course_id: 100,
        course_version: None,
    };

    let response = handlers::handle_enroll(&ctx.services, &ctx.request_as(1), params(99)).await;
    assert!(!response.success);
    assert_eq!(response.message, "User is not a member of this group.");

    let response = handlers::handle_enroll(&ctx.services, &ctx.request_as(10), params(10)).await;
    assert_eq!(response.message, "Permission denied.");

    let response = handlers::handle_enroll(&ctx.services, &ctx.request_as(1), params(10)).await;
    assert!(response.success);
    let enrollment = response.data.unwrap();
    assert_eq!(enrollment.course_version, 1);

    let response = handlers::handle_enroll(&ctx.services, &ctx.request_as(1), params(10)).await;
    assert!(!response.success);
    assert_eq!(response.message, "User is already enrolled in this course version.");

    let response = handlers::handle_record_fee(&ctx.services, &ctx.request_as(1), enrollment.id, "12.5", "state report").await;
    assert!(response.success);
    let response = handlers::handle_record_fee(&ctx.services, &ctx.request_as(1), enrollment.id, "twelve", "x").await;
    assert_eq!(response.message, "Invalid parameters.");
    let response = handlers::handle_record_fee(&ctx.services, &ctx.request_as(10), enrollment.id, "1", "x").await;
    assert_eq!(response.message, "Permission denied.");

    let unenroll = UnenrollParams {
        group_id: group.id,
        user_id: 10,
        course_id: 100,
        enrollment_id: None,
    };
    let response = handlers::handle_unenroll(&ctx.services, &ctx.request_as(1), unenroll.clone()).await;
    assert!(response.success);
    let response = handlers::handle_unenroll(&ctx.services, &ctx.request_as(1), unenroll).await;
    assert!(!response.success);

    let response = handlers::handle_group_enrollments(&ctx.services, &ctx.request_as(1), group.id).await;
    assert_eq!(response.data.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_search_handlers() {
    let ctx = TestContext::new().await;
    ctx.identity.grant_role(1, "administrator");
    ctx.identity.add_user(10, "Ada Lovelace", "ada@example.com");
    ctx.identity.add_user(11, "Alan Turing", "alan@example.com");
    ctx.course(100, dec!(10.00));

    let response = handlers::search_users(&ctx.services, &ctx.request_as(1), "a").await;
    assert!(!response.success);
    assert_eq!(response.message, "Please enter at least 2 characters.");

    let response = handlers::search_users(&ctx.services, &ctx.request_as(1), "ada").await;
    let results = response.data.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 10);
    assert_eq!(results[0].text, "Ada Lovelace (ada@example.com)");

    let response = handlers::search_courses(&ctx.services, &ctx.request_as(1), "course").await;
    assert_eq!(response.data.unwrap()[0].text, "Course 100");

    let response = handlers::search_users(&ctx.services, &ctx.request_as(2), "ada").await;
    assert_eq!(response.message, "Permission denied.");
}

#[tokio::test]
#[serial]
async fn test_checkout_handlers() {
    let ctx = TestContext::new().await;
    let group = ctx.group_with_members("Acme", 1, &[10]).await;
    ctx.course(100, dec!(100.00));
    let commerce = FakeCommerce::default();

    let response = handlers::handle_group_checkout(&ctx.services, &ctx.request_as(1), group.id, &commerce).await;
    assert!(!response.success);
    assert_eq!(response.message, "No pending enrollments to checkout.");

    ctx.services.enrollment_service.enroll(group.id, 10, 100, 1, 1).await.unwrap();

    let response = handlers::handle_group_summary(&ctx.services, &ctx.request_as(1), group.id).await;
    assert_eq!(response.data.unwrap().total, dec!(100.00));

    let response = handlers::handle_group_checkout(&ctx.services, &ctx.request_as(1), group.id, &commerce).await;
    assert!(response.success);
    assert_eq!(response.data.unwrap().added, 1);

    let response = handlers::handle_group_invoices(&ctx.services, &ctx.request_as(1), group.id).await;
    assert!(response.data.unwrap().is_empty());
}
