/// Authentication endpoints
///
/// - `POST /api/auth/signup` - Create an account
/// - `POST /api/auth/signin` - Exchange credentials for a token
/// - `POST /api/auth/request-password-reset` - Issue a reset token
/// - `POST /api/auth/reset-password` - Set a new password with a reset token
/// - `GET /api/auth/me` - Current user's profile
///
/// Signup and signin answer `{message, user, token}` on success and
/// `{error}` on failure. The other three use the standard envelope.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, AuthEndpointError},
    extract::AppJson,
    response::ApiResponse,
    routes::validation::{adult_dob, valid_phone},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use snackfund_shared::{
    auth::{
        jwt::{self, Claims},
        middleware::AuthContext,
        password,
        reset_token::{self, RESET_TOKEN_TTL_LABEL},
    },
    models::user::{CreateUser, PublicUser, User},
};
use validator::{Validate, ValidateEmail};

/// Signup request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 2, max = 255, message = "Full name must be between 2 and 255 characters"))]
    pub full_name: String,

    #[validate(
        email(message = "Valid email is required"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    #[validate(
        custom(function = "valid_phone", message = "Valid phone number is required"),
        length(max = 32, message = "Phone number must be at most 32 characters")
    )]
    pub phone: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,

    #[validate(custom(function = "adult_dob", message = "You must be at least 18 years old"))]
    pub dob: NaiveDate,
}

/// Signin request
#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Signup and signin success body
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetIssued {
    /// Returned directly because there is no mail delivery
    pub reset_token: String,
    pub expires_in: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub new_password: String,
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let claims = Claims::with_expiration(user.id, user.email.clone(), state.token_lifetime());
    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}

/// Create an account
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/signup
/// Content-Type: application/json
///
/// {
///   "fullName": "Ana Lima",
///   "email": "ana@example.com",
///   "phone": "+1 555 010 2030",
///   "password": "correct horse",
///   "dob": "1990-04-02"
/// }
/// ```
///
/// # Errors
///
/// - `400`: Validation failed, or the email is already registered
pub async fn signup(
    State(state): State<AppState>,
    body: Result<AppJson<SignupRequest>, ApiError>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthEndpointError> {
    let AppJson(req) = body?;
    req.validate().map_err(ApiError::from)?;

    let password_hash = password::hash_password(&req.password).map_err(ApiError::from)?;

    let user = User::create(
        &state.db,
        CreateUser {
            full_name: req.full_name,
            email: req.email,
            phone: req.phone,
            password_hash,
            dob: req.dob,
        },
    )
    .await
    .map_err(ApiError::from)?;

    let token = issue_token(&state, &user)?;

    tracing::info!(user_id = %user.id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// Exchange credentials for a token
///
/// # Errors
///
/// - `400`: Validation failed
/// - `401`: Unknown email or wrong password
/// - `403`: Account deactivated
pub async fn signin(
    State(state): State<AppState>,
    body: Result<AppJson<SigninRequest>, ApiError>,
) -> Result<Json<AuthResponse>, AuthEndpointError> {
    let AppJson(req) = body?;
    req.validate().map_err(ApiError::from)?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash).map_err(ApiError::from)? {
        tracing::warn!(user_id = %user.id, "signin failed: wrong password");
        return Err(invalid().into());
    }

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "signin refused: account deactivated");
        return Err(ApiError::Forbidden("Account is deactivated".to_string()).into());
    }

    let token = issue_token(&state, &user)?;

    tracing::info!(user_id = %user.id, "user signed in");

    Ok(Json(AuthResponse {
        message: "Signed in successfully".to_string(),
        user: user.into(),
        token,
    }))
}

/// Issue a password reset token
///
/// Replaces any token issued earlier for the same user.
///
/// # Errors
///
/// - `400`: Email missing or malformed
/// - `404`: No user with that email
pub async fn request_password_reset(
    State(state): State<AppState>,
    AppJson(req): AppJson<PasswordResetRequest>,
) -> ApiResult<ApiResponse<PasswordResetIssued>> {
    if !req.email.validate_email() {
        return Err(ApiError::invalid("email", "Valid email is required"));
    }

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User with this email not found".to_string()))?;

    let (token, digest) = reset_token::generate_reset_token();
    let expires_at = reset_token::reset_token_expiry(Utc::now());

    User::set_reset_token(&state.db, user.id, &digest, expires_at).await?;

    tracing::info!(user_id = %user.id, %expires_at, "password reset requested");

    Ok(ApiResponse::ok(
        "Password reset token generated successfully",
        PasswordResetIssued {
            reset_token: token,
            expires_in: RESET_TOKEN_TTL_LABEL.to_string(),
        },
    ))
}

/// Set a new password using a reset token
///
/// Checks run in a fixed order: email, token present, password length,
/// user exists, token matches, token not expired. The first failure wins.
///
/// # Errors
///
/// - `400`: Any input check failed, the token doesn't match, or it expired
/// - `404`: No user with that email
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<ResetPasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    if !req.email.validate_email() {
        return Err(ApiError::invalid("email", "Valid email is required"));
    }

    if req.token.trim().is_empty() {
        return Err(ApiError::invalid("token", "Reset token is required"));
    }

    password::validate_password_strength(&req.new_password)
        .map_err(|message| ApiError::invalid("newPassword", message))?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let invalid_token = || ApiError::BadRequest("Invalid reset token".to_string());

    let stored_digest = user.reset_token_hash.as_deref().ok_or_else(invalid_token)?;
    if !reset_token::verify_reset_token(&req.token, stored_digest) {
        tracing::warn!(user_id = %user.id, "password reset with wrong token");
        return Err(invalid_token());
    }

    match user.reset_token_expiry {
        Some(expiry) if expiry > Utc::now() => {}
        _ => return Err(ApiError::BadRequest("Reset token has expired".to_string())),
    }

    let new_hash = password::hash_password(&req.new_password)?;

    // Guarded on the digest, so a concurrent reset with the same token loses
    let changed =
        User::complete_password_reset(&state.db, user.id, stored_digest, &new_hash).await?;
    if !changed {
        return Err(invalid_token());
    }

    tracing::info!(user_id = %user.id, "password reset completed");

    Ok(ApiResponse::message("Password reset successfully"))
}

/// Current user's public profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        "User information retrieved successfully",
        PublicUser::from(user),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn signup_request(dob: NaiveDate) -> SignupRequest {
        SignupRequest {
            full_name: "Ana Lima".to_string(),
            email: "ana@example.com".to_string(),
            phone: "+1 555 010 2030".to_string(),
            password: "correct horse".to_string(),
            dob,
        }
    }

    #[test]
    fn test_signup_request_accepts_adult() {
        let dob = NaiveDate::from_ymd_opt(1990, 4, 2).unwrap();
        assert!(signup_request(dob).validate().is_ok());
    }

    #[test]
    fn test_signup_request_rejects_minor() {
        let today = Utc::now().date_naive();
        let dob = NaiveDate::from_ymd_opt(today.year() - 17, 1, 1).unwrap();

        let err: ApiError = signup_request(dob).validate().unwrap_err().into();
        assert_eq!(err.client_message(), "You must be at least 18 years old");
    }

    #[test]
    fn test_signup_request_rejects_bad_fields() {
        let mut req = signup_request(NaiveDate::from_ymd_opt(1990, 4, 2).unwrap());
        req.email = "not-an-email".to_string();
        req.phone = "123".to_string();
        req.password = "short".to_string();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_signup_request_is_camel_case() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"fullName":"Ana Lima","email":"ana@example.com","phone":"5550102030","password":"correct horse","dob":"1990-04-02"}"#,
        )
        .unwrap();
        assert_eq!(req.full_name, "Ana Lima");
    }

    #[test]
    fn test_reset_request_tolerates_missing_fields() {
        let req: ResetPasswordRequest = serde_json::from_str(r#"{"email":"ana@example.com"}"#).unwrap();
        assert!(req.token.is_empty());
        assert!(req.new_password.is_empty());
    }
}
