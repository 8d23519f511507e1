/// Team rule endpoints
///
/// Rules are listed newest first. Reads need an active membership; writes
/// need the fund manager role.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    middleware::team::CurrentTeam,
    response::ApiResponse,
    routes::validation::{non_negative_amount, not_blank},
};
use axum::extract::State;
use serde::Deserialize;
use snackfund_shared::{
    auth::authorization::{require_active_member, require_fund_manager},
    models::rule::{CreateRule, Rule, UpdateRule},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 255, message = "Title must be at most 255 characters")
    )]
    pub title: String,

    #[validate(custom(function = "non_negative_amount", message = "Amount must be non-negative"))]
    pub amount: f64,

    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRuleRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 255, message = "Title must be at most 255 characters")
    )]
    pub title: Option<String>,

    #[validate(custom(function = "non_negative_amount", message = "Amount must be non-negative"))]
    pub amount: Option<f64>,

    pub description: Option<String>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Rule not found".to_string())
}

pub async fn create_rule(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppJson(req): AppJson<CreateRuleRequest>,
) -> ApiResult<ApiResponse<Rule>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    let rule = Rule::create(
        &state.db,
        CreateRule {
            team_id: scope.team_id,
            title: req.title.trim().to_string(),
            amount: req.amount,
            description: req.description,
        },
    )
    .await?;

    Ok(ApiResponse::created("Rule added successfully", rule))
}

pub async fn list_rules(
    State(state): State<AppState>,
    scope: CurrentTeam,
) -> ApiResult<ApiResponse<Vec<Rule>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let rules = Rule::list_by_team(&state.db, scope.team_id).await?;

    Ok(ApiResponse::ok("Rules retrieved successfully", rules))
}

pub async fn get_rule(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<Rule>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let rule = Rule::find_in_team(&state.db, scope.team_id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok("Rule retrieved successfully", rule))
}

pub async fn update_rule(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateRuleRequest>,
) -> ApiResult<ApiResponse<Rule>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    let rule = Rule::update(
        &state.db,
        scope.team_id,
        id,
        UpdateRule {
            title: req.title.map(|t| t.trim().to_string()),
            amount: req.amount,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(ApiResponse::ok("Rule updated successfully", rule))
}

/// Delete a rule
///
/// Violations that reference it are kept; their `ruleData` comes back null.
pub async fn delete_rule(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;

    if !Rule::delete(&state.db, scope.team_id, id).await? {
        return Err(not_found());
    }

    tracing::info!(rule_id = %id, team_id = %scope.team_id, "rule deleted");

    Ok(ApiResponse::message("Rule deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rule_request_validation() {
        let req: CreateRuleRequest =
            serde_json::from_str(r#"{"title": "Late to standup", "amount": 2.5}"#).unwrap();
        assert!(req.validate().is_ok());

        let req: CreateRuleRequest =
            serde_json::from_str(r#"{"title": "", "amount": 2.5}"#).unwrap();
        let err: ApiError = req.validate().unwrap_err().into();
        assert_eq!(err.client_message(), "Title is required");
    }
}
