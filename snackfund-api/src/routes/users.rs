/// User profile endpoint
///
/// `PUT /api/users/:id`
///
/// A user may edit their own name, email and phone. A fund manager of the
/// caller's current team may edit any member of that team, and is the only
/// one who may change `isActive`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    response::ApiResponse,
    routes::validation::{not_blank, valid_phone},
};
use axum::{extract::State, Extension};
use serde::Deserialize;
use snackfund_shared::{
    auth::{authorization::require_fund_manager, middleware::AuthContext},
    models::{
        membership::TeamMembership,
        user::{PublicUser, UpdateUser, User},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 2, max = 255, message = "Full name must be between 2 and 255 characters"),
        custom(function = "not_blank", message = "Full name must be between 2 and 255 characters")
    )]
    pub full_name: Option<String>,

    #[validate(
        email(message = "Valid email is required"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[validate(
        custom(function = "valid_phone", message = "Valid phone number is required"),
        length(max = 32, message = "Phone number must be at most 32 characters")
    )]
    pub phone: Option<String>,

    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.is_active.is_none()
    }
}

/// Update a user's profile
///
/// # Errors
///
/// - `400`: Validation failed, empty update, or email already in use
/// - `403`: Not self, and not a fund manager of a team the target is in;
///   or a non-fund-manager touched `isActive`
/// - `404`: Target user doesn't exist
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    req.validate()?;

    if req.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let is_self = target.id == auth.user_id;

    if !is_self || req.is_active.is_some() {
        authorize_as_fund_manager(&state, auth.user_id, target.id).await?;
    }

    let updated = User::update(
        &state.db,
        target.id,
        UpdateUser {
            full_name: req.full_name,
            email: req.email,
            phone: req.phone,
            is_active: req.is_active,
        },
    )
    .await
    .map_err(|err| match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::Conflict("Email is already in use".to_string()),
        other => other,
    })?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if let Some(active) = req.is_active {
        tracing::info!(actor = %auth.user_id, user_id = %updated.id, active, "account status changed");
    }

    Ok(ApiResponse::ok("User updated successfully", updated.into()))
}

/// Caller must manage the fund of their current team, and the target must
/// belong to that team
async fn authorize_as_fund_manager(
    state: &AppState,
    actor_id: Uuid,
    target_id: Uuid,
) -> ApiResult<()> {
    let actor = User::find_by_id(&state.db, actor_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    let team_id = actor.current_team_id.ok_or_else(|| {
        ApiError::Forbidden("You don't have permission to update this user".to_string())
    })?;

    require_fund_manager(&state.db, team_id, actor_id).await?;

    if TeamMembership::find(&state.db, team_id, target_id).await?.is_none() {
        return Err(ApiError::Forbidden(
            "You don't have permission to update this user".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_detected() {
        let req: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.is_empty());

        let req: UpdateUserRequest = serde_json::from_str(r#"{"isActive": false}"#).unwrap();
        assert!(!req.is_empty());
    }

    #[test]
    fn test_optional_fields_validated_when_present() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"email": "nope", "phone": "12"}"#).unwrap();
        let errors = req.validate().unwrap_err();

        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("phone"));
    }
}
