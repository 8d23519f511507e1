/// Integration tests for accounts and authentication
///
/// Covers signup, signin, the bearer-protected surface and the password
/// reset flow.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestContext;
use serde_json::json;
use snackfund_shared::models::user::User;

#[tokio::test]
async fn test_signup_stores_hash_not_password() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("Hash Check").await;

    let row = User::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
    assert_ne!(row.password_hash, user.password);
    assert!(row.password_hash.starts_with("$argon2"));
    assert!(row.is_active);
}

#[tokio::test]
async fn test_duplicate_signup_uses_error_body() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("Taken").await;

    let (status, body) = ctx
        .post(
            "/api/auth/signup",
            None,
            json!({
                "fullName": "Someone Else",
                "email": user.email,
                "phone": "5550102030",
                "password": "another-password",
                "dob": "1985-01-01",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User with this email already exists");
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn test_underage_signup_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let dob = (Utc::now() - Duration::days(365 * 16)).date_naive();

    let (status, body) = ctx
        .post(
            "/api/auth/signup",
            None,
            json!({
                "fullName": "Young Person",
                "email": common::unique_email("young"),
                "phone": "5550102030",
                "password": "long-enough-password",
                "dob": dob,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You must be at least 18 years old");
}

#[tokio::test]
async fn test_signin_with_wrong_password() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("Signer").await;

    let (status, body) = ctx
        .post(
            "/api/auth/signin",
            None,
            json!({ "email": user.email, "password": "not-the-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, body) = ctx
        .post(
            "/api/auth/signin",
            None,
            json!({ "email": user.email, "password": user.password }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["email"], user.email);
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = ctx.get("/api/auth/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = ctx.signup("Me").await;
    let (status, body) = ctx.get("/api/auth/me", user.bearer()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user.id.to_string());
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.get("/api/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["statusCode"], 404);
}

#[tokio::test]
async fn test_ledger_without_team_needs_selection() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("Teamless").await;

    let (status, body) = ctx.get("/api/payments", user.bearer()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No active team selected");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("Forgetful").await;

    let (status, body) = ctx
        .post(
            "/api/auth/request-password-reset",
            None,
            json!({ "email": user.email }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["expiresIn"], "1 hour");
    let token = body["data"]["resetToken"].as_str().unwrap().to_string();

    let row = User::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
    let expiry = row.reset_token_expiry.unwrap();
    let remaining = expiry - Utc::now();
    assert!(remaining > Duration::minutes(55) && remaining <= Duration::minutes(60));
    assert_ne!(row.reset_token_hash.as_deref(), Some(token.as_str()));

    let (status, body) = ctx
        .post(
            "/api/auth/reset-password",
            None,
            json!({ "email": user.email, "token": "wrong", "newPassword": "brand-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid reset token");

    let (status, body) = ctx
        .post(
            "/api/auth/reset-password",
            None,
            json!({ "email": user.email, "token": token, "newPassword": "brand-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let row = User::find_by_id(&ctx.db, user.id).await.unwrap().unwrap();
    assert!(row.reset_token_hash.is_none());
    assert!(row.reset_token_expiry.is_none());

    let (status, _) = ctx
        .post(
            "/api/auth/reset-password",
            None,
            json!({ "email": user.email, "token": token, "newPassword": "another-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post(
            "/api/auth/signin",
            None,
            json!({ "email": user.email, "password": "brand-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deactivated_account_cannot_sign_in() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("Dormant").await;

    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user.id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let (status, body) = ctx
        .post(
            "/api/auth/signin",
            None,
            json!({ "email": user.email, "password": user.password }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Account is deactivated");
}

#[tokio::test]
async fn test_profile_update_rules() {
    let ctx = TestContext::new().await.unwrap();
    let alice = ctx.signup("Alice").await;
    let bob = ctx.signup("Bob").await;

    let (status, body) = ctx
        .put(
            &format!("/api/users/{}", alice.id),
            alice.bearer(),
            json!({ "fullName": "Alice Liddell" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["fullName"], "Alice Liddell");

    let (status, body) = ctx
        .put(
            &format!("/api/users/{}", alice.id),
            alice.bearer(),
            json!({ "email": bob.email }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email is already in use");

    // Bob shares no team with Alice
    let (status, _) = ctx
        .put(
            &format!("/api/users/{}", alice.id),
            bob.bearer(),
            json!({ "fullName": "Mallory" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_expired_reset_token_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("Late").await;

    let (status, body) = ctx
        .post(
            "/api/auth/request-password-reset",
            None,
            json!({ "email": user.email }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let token = body["data"]["resetToken"].as_str().unwrap().to_string();

    sqlx::query("UPDATE users SET reset_token_expiry = now() - interval '1 minute' WHERE id = $1")
        .bind(user.id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let (status, body) = ctx
        .post(
            "/api/auth/reset-password",
            None,
            json!({ "email": user.email, "token": token, "newPassword": "brand-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Reset token has expired");

    let (status, _) = ctx
        .post(
            "/api/auth/signin",
            None,
            json!({ "email": user.email, "password": user.password }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_overlong_full_name_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .post(
            "/api/auth/signup",
            None,
            json!({
                "fullName": "N".repeat(300),
                "email": common::unique_email("Verbose"),
                "phone": "5550102030",
                "password": "correct-horse-battery",
                "dob": "1990-05-17",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Full name must be between 2 and 255 characters");
}
