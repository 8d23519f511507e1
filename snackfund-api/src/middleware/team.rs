/// Current-team resolution for ledger routes
///
/// Every ledger operation runs against the caller's `currentTeamId`. The
/// [`CurrentTeam`] extractor loads it fresh from the database on each
/// request; nothing about the team is cached in the token.

use crate::{app::AppState, error::ApiError};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use snackfund_shared::{auth::middleware::AuthContext, models::user::User};
use uuid::Uuid;

/// The authenticated caller plus the team their request operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentTeam {
    pub user_id: Uuid,
    pub team_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentTeam {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let user = User::find_by_id(&state.db, auth.user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        let team_id = user
            .current_team_id
            .ok_or_else(|| ApiError::BadRequest("No active team selected".to_string()))?;

        Ok(CurrentTeam {
            user_id: user.id,
            team_id,
        })
    }
}
