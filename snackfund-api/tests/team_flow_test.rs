/// Integration tests for teams and membership
///
/// These tests verify team creation, membership management and role
/// delegation end-to-end through the router.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use snackfund_shared::models::{membership::TeamMembership, user::User};

/// Founder gets every role, delegates fund management, and can't be
/// deactivated by a non-lead
#[tokio::test]
async fn test_team_lifecycle_end_to_end() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.signup("Alice").await;
    let bob = ctx.signup("Bob").await;

    let team_id = ctx.create_team(&alice, "Alpha").await;

    let founder = TeamMembership::find(&ctx.db, team_id, alice.id)
        .await
        .unwrap()
        .unwrap();
    assert!(founder.is_team_lead && founder.is_fund_manager && founder.is_food_manager);
    assert!(founder.is_active);

    let alice_row = User::find_by_id(&ctx.db, alice.id).await.unwrap().unwrap();
    assert_eq!(alice_row.current_team_id, Some(team_id));

    ctx.add_member(&alice, team_id, &bob).await;
    let member = TeamMembership::find(&ctx.db, team_id, bob.id)
        .await
        .unwrap()
        .unwrap();
    assert!(member.is_active);
    assert!(!member.is_team_lead && !member.is_fund_manager && !member.is_food_manager);

    // Bob had no team yet, so adding him selected this one
    let bob_row = User::find_by_id(&ctx.db, bob.id).await.unwrap().unwrap();
    assert_eq!(bob_row.current_team_id, Some(team_id));

    let (status, body) = ctx
        .assign_roles(&alice, team_id, &bob, json!({ "isFundManager": true }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["isFundManager"], true);

    let (status, body) = ctx
        .post(
            "/api/rules",
            alice.bearer(),
            json!({ "title": "Late to standup", "amount": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let rule_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .post(
            "/api/rule-violations",
            bob.bearer(),
            json!({ "violatorId": alice.id, "ruleId": rule_id, "additionalAmount": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["updatedBy"], bob.id.to_string());
    assert_eq!(body["data"]["violatorData"]["id"], alice.id.to_string());
    assert_eq!(body["data"]["ruleData"]["title"], "Late to standup");

    let (status, body) = ctx
        .put(
            &format!("/api/teams/{}/members/{}", team_id, alice.id),
            bob.bearer(),
            json!({ "action": "deactivate" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
    assert_eq!(body["success"], false);

    let founder = TeamMembership::find(&ctx.db, team_id, alice.id)
        .await
        .unwrap()
        .unwrap();
    assert!(founder.is_active);
}

#[tokio::test]
async fn test_duplicate_member_is_conflict() {
    let ctx = TestContext::new().await.unwrap();
    let lead = ctx.signup("Lead").await;
    let member = ctx.signup("Member").await;
    let team_id = ctx.create_team(&lead, "Dupes").await;

    ctx.add_member(&lead, team_id, &member).await;

    let (status, body) = ctx
        .post(
            &format!("/api/teams/{}/members", team_id),
            lead.bearer(),
            json!({ "userId": member.id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User is already a member of this team");
}

#[tokio::test]
async fn test_duplicate_team_name_is_conflict() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.signup("Owner").await;
    let name = common::unique_team_name("Taken");

    let (status, _) = ctx
        .post("/api/teams", owner.bearer(), json!({ "teamName": name }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx
        .post("/api/teams", owner.bearer(), json!({ "teamName": name }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Team name already exists");
}

/// A member with no roles can't grant themselves one
#[tokio::test]
async fn test_role_escalation_denied() {
    let ctx = TestContext::new().await.unwrap();
    let lead = ctx.signup("Lead").await;
    let member = ctx.signup("Member").await;
    let team_id = ctx.create_team(&lead, "Guarded").await;
    ctx.add_member(&lead, team_id, &member).await;

    let (status, _) = ctx
        .assign_roles(&member, team_id, &member, json!({ "isFoodManager": true }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let unchanged = TeamMembership::find(&ctx.db, team_id, member.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!unchanged.is_food_manager);
}

#[tokio::test]
async fn test_empty_role_data_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let lead = ctx.signup("Lead").await;
    let member = ctx.signup("Member").await;
    let team_id = ctx.create_team(&lead, "Empty").await;
    ctx.add_member(&lead, team_id, &member).await;

    let (status, body) = ctx.assign_roles(&lead, team_id, &member, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "At least one role must be specified");
}

#[tokio::test]
async fn test_self_deactivation_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let lead = ctx.signup("Lead").await;
    let team_id = ctx.create_team(&lead, "Solo").await;

    let (status, _) = ctx
        .put(
            &format!("/api/teams/{}/members/{}", team_id, lead.id),
            lead.bearer(),
            json!({ "action": "deactivate" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Deactivated members lose read access and can't be given roles again
#[tokio::test]
async fn test_deactivation_is_terminal() {
    let ctx = TestContext::new().await.unwrap();
    let lead = ctx.signup("Lead").await;
    let member = ctx.signup("Member").await;
    let team_id = ctx.create_team(&lead, "Terminal").await;
    ctx.add_member(&lead, team_id, &member).await;

    let (status, body) = ctx
        .put(
            &format!("/api/teams/{}/members/{}", team_id, member.id),
            lead.bearer(),
            json!({ "action": "deactivate" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["isActive"], false);

    let (status, _) = ctx.get("/api/expenses", member.bearer()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .assign_roles(&lead, team_id, &member, json!({ "isFundManager": true }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot assign roles to an inactive member");
}

#[tokio::test]
async fn test_team_listing_and_switching() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("Switcher").await;
    let first = ctx.create_team(&user, "First").await;
    let second = ctx.create_team(&user, "Second").await;

    let (status, body) = ctx.get("/api/teams", user.bearer()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = ctx
        .post(&format!("/api/teams/{}/switch", first), user.bearer(), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["currentTeamId"], first.to_string());

    let (status, body) = ctx.get(&format!("/api/teams/{}", second), user.bearer()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["members"][0]["user"]["id"], user.id.to_string());
}

#[tokio::test]
async fn test_switch_to_foreign_team_forbidden() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.signup("Owner").await;
    let outsider = ctx.signup("Outsider").await;
    let team_id = ctx.create_team(&owner, "Private").await;

    let (status, _) = ctx
        .post(&format!("/api/teams/{}/switch", team_id), outsider.bearer(), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_overlong_team_name_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let lead = ctx.signup("Lead").await;

    let (status, body) = ctx
        .post(
            "/api/teams",
            lead.bearer(),
            json!({ "teamName": "T".repeat(300) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Team name must be between 2 and 255 characters");
}

/// A lead who was deactivated by another lead keeps the flag but loses
/// the authority that comes with it
#[tokio::test]
async fn test_deactivated_lead_cannot_assign_roles() {
    let ctx = TestContext::new().await.unwrap();
    let first = ctx.signup("First").await;
    let second = ctx.signup("Second").await;
    let member = ctx.signup("Member").await;
    let team_id = ctx.create_team(&first, "Coup").await;
    ctx.add_member(&first, team_id, &second).await;
    ctx.add_member(&first, team_id, &member).await;

    let (status, body) = ctx
        .assign_roles(&first, team_id, &second, json!({ "isTeamLead": true }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = ctx
        .put(
            &format!("/api/teams/{}/members/{}", team_id, first.id),
            second.bearer(),
            json!({ "action": "deactivate" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, _) = ctx
        .assign_roles(&first, team_id, &member, json!({ "isFundManager": true }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let unchanged = TeamMembership::find(&ctx.db, team_id, member.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!unchanged.is_fund_manager);
}
