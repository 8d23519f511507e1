/// Rule violation endpoints
///
/// A violation fines a member for breaking one of the current team's rules.
/// Every write stamps the caller into `updatedBy`. Responses carry the
/// violator's public profile (`violatorData`) and the rule (`ruleData`).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    middleware::team::CurrentTeam,
    response::ApiResponse,
    routes::{
        load_users,
        validation::{deserialize_optional_datetime, non_negative_amount},
    },
};
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snackfund_shared::{
    auth::authorization::{require_active_member, require_fund_manager},
    models::{
        membership::TeamMembership,
        rule::Rule,
        rule_violation::{CreateRuleViolation, RuleViolation, UpdateRuleViolation},
        user::PublicUser,
    },
};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateViolationRequest {
    pub violator_id: Uuid,
    pub rule_id: Uuid,

    #[validate(
        required(message = "Valid additional amount is required"),
        custom(
            function = "non_negative_amount",
            message = "Additional amount must be non-negative"
        )
    )]
    pub additional_amount: Option<f64>,

    pub note: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateViolationRequest {
    pub violator_id: Option<Uuid>,
    pub rule_id: Option<Uuid>,

    #[validate(custom(
        function = "non_negative_amount",
        message = "Additional amount must be non-negative"
    ))]
    pub additional_amount: Option<f64>,

    pub note: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

/// Violation with its violator and rule attached
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationView {
    #[serde(flatten)]
    pub violation: RuleViolation,
    pub violator_data: Option<PublicUser>,
    pub rule_data: Option<Rule>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Rule violation not found".to_string())
}

async fn enrich(
    state: &AppState,
    team_id: Uuid,
    violations: Vec<RuleViolation>,
) -> ApiResult<Vec<ViolationView>> {
    let users = load_users(&state.db, violations.iter().map(|v| v.violator_id)).await?;

    let mut rule_ids: Vec<Uuid> = violations.iter().map(|v| v.rule_id).collect();
    rule_ids.sort_unstable();
    rule_ids.dedup();
    let rules: HashMap<Uuid, Rule> = Rule::find_many_in_team(&state.db, team_id, &rule_ids)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    Ok(violations
        .into_iter()
        .map(|violation| ViolationView {
            violator_data: users.get(&violation.violator_id).cloned(),
            rule_data: rules.get(&violation.rule_id).cloned(),
            violation,
        })
        .collect())
}

async fn enrich_one(
    state: &AppState,
    team_id: Uuid,
    violation: RuleViolation,
) -> ApiResult<ViolationView> {
    enrich(state, team_id, vec![violation])
        .await?
        .pop()
        .ok_or_else(not_found)
}

async fn ensure_rule_in_team(state: &AppState, team_id: Uuid, rule_id: Uuid) -> ApiResult<()> {
    if Rule::find_in_team(&state.db, team_id, rule_id).await?.is_none() {
        return Err(ApiError::NotFound("Rule not found".to_string()));
    }
    Ok(())
}

async fn ensure_violator_in_team(state: &AppState, team_id: Uuid, user_id: Uuid) -> ApiResult<()> {
    if TeamMembership::find(&state.db, team_id, user_id).await?.is_none() {
        return Err(ApiError::BadRequest(
            "Violator is not a member of this team".to_string(),
        ));
    }
    Ok(())
}

/// Fine a member
///
/// # Errors
///
/// - `400`: Validation failed, or the violator isn't on the team
/// - `403`: Caller isn't a fund manager
/// - `404`: Rule isn't one of the team's
pub async fn create_violation(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppJson(req): AppJson<CreateViolationRequest>,
) -> ApiResult<ApiResponse<ViolationView>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    ensure_rule_in_team(&state, scope.team_id, req.rule_id).await?;
    ensure_violator_in_team(&state, scope.team_id, req.violator_id).await?;

    let violation = RuleViolation::create(
        &state.db,
        CreateRuleViolation {
            team_id: scope.team_id,
            violator_id: req.violator_id,
            rule_id: req.rule_id,
            additional_amount: req.additional_amount.unwrap_or_default(),
            updated_by: scope.user_id,
            note: req.note,
            date: req.date,
        },
    )
    .await?;

    tracing::info!(
        violation_id = %violation.id,
        violator_id = %violation.violator_id,
        rule_id = %violation.rule_id,
        actor = %scope.user_id,
        "rule violation recorded"
    );

    Ok(ApiResponse::created(
        "Rule violation added successfully",
        enrich_one(&state, scope.team_id, violation).await?,
    ))
}

pub async fn list_violations(
    State(state): State<AppState>,
    scope: CurrentTeam,
) -> ApiResult<ApiResponse<Vec<ViolationView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let violations = RuleViolation::list_by_team(&state.db, scope.team_id).await?;

    Ok(ApiResponse::ok(
        "Rule violations retrieved successfully",
        enrich(&state, scope.team_id, violations).await?,
    ))
}

pub async fn get_violation(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<ViolationView>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let violation = RuleViolation::find_in_team(&state.db, scope.team_id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Rule violation retrieved successfully",
        enrich_one(&state, scope.team_id, violation).await?,
    ))
}

/// Edit a violation; the caller becomes its `updatedBy`
pub async fn update_violation(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateViolationRequest>,
) -> ApiResult<ApiResponse<ViolationView>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    if let Some(rule_id) = req.rule_id {
        ensure_rule_in_team(&state, scope.team_id, rule_id).await?;
    }
    if let Some(violator_id) = req.violator_id {
        ensure_violator_in_team(&state, scope.team_id, violator_id).await?;
    }

    let violation = RuleViolation::update(
        &state.db,
        scope.team_id,
        id,
        UpdateRuleViolation {
            updated_by: scope.user_id,
            violator_id: req.violator_id,
            rule_id: req.rule_id,
            additional_amount: req.additional_amount,
            note: req.note,
            date: req.date,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Rule violation updated successfully",
        enrich_one(&state, scope.team_id, violation).await?,
    ))
}

pub async fn delete_violation(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;

    if !RuleViolation::delete(&state.db, scope.team_id, id).await? {
        return Err(not_found());
    }

    tracing::info!(violation_id = %id, actor = %scope.user_id, "rule violation deleted");

    Ok(ApiResponse::message("Rule violation deleted successfully"))
}

/// Violations charged to one member
pub async fn list_violations_by_violator(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(user_id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<ViolationView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let violations = RuleViolation::list_by_violator(&state.db, scope.team_id, user_id).await?;

    Ok(ApiResponse::ok(
        "Rule violations retrieved successfully",
        enrich(&state, scope.team_id, violations).await?,
    ))
}

/// Violations of one rule
pub async fn list_violations_by_rule(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(rule_id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<ViolationView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let violations = RuleViolation::list_by_rule(&state.db, scope.team_id, rule_id).await?;

    Ok(ApiResponse::ok(
        "Rule violations retrieved successfully",
        enrich(&state, scope.team_id, violations).await?,
    ))
}
