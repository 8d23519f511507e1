/// Team and membership endpoints
///
/// - `POST /api/teams` - Create a team; the creator holds every role
/// - `GET /api/teams` - Teams the caller belongs to, with their membership
/// - `GET /api/teams/:id` - Team detail with member profiles
/// - `POST /api/teams/:id/members` - Add a member (team lead)
/// - `PUT /api/teams/:id/members/:user_id` - Deactivate or assign roles
/// - `POST /api/teams/:id/switch` - Make a team the caller's current team
///
/// Membership rows are never deleted. Deactivation is final: there is no
/// operation that sets `isActive` back to true.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    response::ApiResponse,
    routes::{load_users, validation::not_blank},
};
use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};
use snackfund_shared::{
    auth::{
        authorization::{
            authorize_role_update, ensure_not_self, require_active_member, require_team_lead,
        },
        middleware::AuthContext,
    },
    models::{
        membership::{CreateMembership, RoleUpdate, TeamMembership},
        team::{CreateTeam, Team},
        user::{PublicUser, User},
    },
};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[validate(
        length(min = 2, max = 255, message = "Team name must be between 2 and 255 characters"),
        custom(function = "not_blank", message = "Team name must be between 2 and 255 characters")
    )]
    pub team_name: String,

    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Option<Uuid>,
}

/// Body of `PUT /api/teams/:id/members/:user_id`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    /// `deactivate` or `assignRole`
    #[serde(default)]
    pub action: String,

    pub role_data: Option<RoleUpdate>,
}

/// What `UpdateMemberRequest::action` names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAction {
    Deactivate,
    AssignRole,
}

impl MemberAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "deactivate" => Some(MemberAction::Deactivate),
            "assignRole" => Some(MemberAction::AssignRole),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TeamCreated {
    pub team: Team,
    pub membership: TeamMembership,
}

/// A team as listed for the caller
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWithMembership {
    #[serde(flatten)]
    pub team: Team,
    pub membership: TeamMembership,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    #[serde(flatten)]
    pub membership: TeamMembership,
    pub user: Option<PublicUser>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<MemberView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSwitched {
    pub current_team_id: Uuid,
    pub team: Team,
}

fn member_not_found() -> ApiError {
    ApiError::NotFound("Member not found in team".to_string())
}

async fn find_team(state: &AppState, team_id: Uuid) -> ApiResult<Team> {
    Team::find_by_id(&state.db, team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))
}

/// Create a team
///
/// The team, the creator's all-roles membership and the creator's
/// `currentTeamId` are written in one transaction.
///
/// # Errors
///
/// - `400`: Name too short or already taken
pub async fn create_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateTeamRequest>,
) -> ApiResult<ApiResponse<TeamCreated>> {
    req.validate()?;

    let mut tx = state.db.begin().await?;

    let team = Team::create(
        &mut *tx,
        CreateTeam {
            team_name: req.team_name,
            description: req.description,
            created_by: auth.user_id,
        },
    )
    .await?;

    let membership =
        TeamMembership::create(&mut *tx, CreateMembership::founder(team.id, auth.user_id)).await?;

    User::set_current_team(&mut *tx, auth.user_id, team.id).await?;

    tx.commit().await?;

    tracing::info!(team_id = %team.id, user_id = %auth.user_id, "team created");

    Ok(ApiResponse::created(
        "Team created successfully",
        TeamCreated { team, membership },
    ))
}

/// List the caller's teams, inactive memberships included
pub async fn list_my_teams(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<ApiResponse<Vec<TeamWithMembership>>> {
    let teams = Team::list_for_user(&state.db, auth.user_id).await?;
    let mut memberships: HashMap<Uuid, TeamMembership> =
        TeamMembership::list_by_user(&state.db, auth.user_id)
            .await?
            .into_iter()
            .map(|m| (m.team_id, m))
            .collect();

    let data = teams
        .into_iter()
        .filter_map(|team| {
            memberships
                .remove(&team.id)
                .map(|membership| TeamWithMembership { team, membership })
        })
        .collect();

    Ok(ApiResponse::ok("Teams retrieved successfully", data))
}

/// Team detail with member profiles
///
/// # Errors
///
/// - `403`: Caller isn't an active member
/// - `404`: No such team
pub async fn get_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(team_id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<TeamDetail>> {
    let team = find_team(&state, team_id).await?;
    require_active_member(&state.db, team_id, auth.user_id).await?;

    let memberships = TeamMembership::list_by_team(&state.db, team_id).await?;
    let mut users = load_users(&state.db, memberships.iter().map(|m| m.user_id)).await?;

    let members = memberships
        .into_iter()
        .map(|membership| MemberView {
            user: users.remove(&membership.user_id),
            membership,
        })
        .collect();

    Ok(ApiResponse::ok(
        "Team retrieved successfully",
        TeamDetail { team, members },
    ))
}

/// Add a user to the team with no roles
///
/// If the new member has no current team yet, this one becomes it.
///
/// # Errors
///
/// - `400`: `userId` missing, or the user is already a member
/// - `403`: Caller isn't a team lead
/// - `404`: Team or user doesn't exist
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(team_id): AppPath<Uuid>,
    AppJson(req): AppJson<AddMemberRequest>,
) -> ApiResult<ApiResponse<TeamMembership>> {
    let user_id = req
        .user_id
        .ok_or_else(|| ApiError::invalid("userId", "User ID is required"))?;

    find_team(&state, team_id).await?;
    require_team_lead(&state.db, team_id, auth.user_id).await?;

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let membership =
        TeamMembership::create(&state.db, CreateMembership::member(team_id, user_id)).await?;

    User::set_current_team_if_unset(&state.db, user_id, team_id).await?;

    tracing::info!(%team_id, %user_id, actor = %auth.user_id, "member added");

    Ok(ApiResponse::created(
        "User added to team successfully",
        membership,
    ))
}

/// Deactivate a member, or change their roles
///
/// # Errors
///
/// - `400`: Unknown action, missing or empty `roleData`, self-deactivation,
///   or role change on an inactive member
/// - `403`: Caller lacks the role the action requires
/// - `404`: Team or member doesn't exist
pub async fn update_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath((team_id, user_id)): AppPath<(Uuid, Uuid)>,
    AppJson(req): AppJson<UpdateMemberRequest>,
) -> ApiResult<ApiResponse<TeamMembership>> {
    let action = MemberAction::parse(&req.action)
        .ok_or_else(|| ApiError::BadRequest("Invalid action".to_string()))?;

    find_team(&state, team_id).await?;

    match action {
        MemberAction::Deactivate => deactivate_member(&state, team_id, auth.user_id, user_id).await,
        MemberAction::AssignRole => {
            let update = req
                .role_data
                .ok_or_else(|| ApiError::invalid("roleData", "roleData is required"))?;
            assign_roles(&state, team_id, auth.user_id, user_id, update).await
        }
    }
}

async fn deactivate_member(
    state: &AppState,
    team_id: Uuid,
    actor_id: Uuid,
    user_id: Uuid,
) -> ApiResult<ApiResponse<TeamMembership>> {
    require_team_lead(&state.db, team_id, actor_id).await?;
    ensure_not_self(actor_id, user_id)?;

    let membership = TeamMembership::deactivate(&state.db, team_id, user_id)
        .await?
        .ok_or_else(member_not_found)?;

    tracing::info!(%team_id, %user_id, actor = %actor_id, "member deactivated");

    Ok(ApiResponse::ok(
        "Team member deactivated successfully",
        membership,
    ))
}

async fn assign_roles(
    state: &AppState,
    team_id: Uuid,
    actor_id: Uuid,
    user_id: Uuid,
    update: RoleUpdate,
) -> ApiResult<ApiResponse<TeamMembership>> {
    if update.is_empty() {
        return Err(ApiError::invalid(
            "roleData",
            "At least one role must be specified",
        ));
    }

    let requester = require_active_member(&state.db, team_id, actor_id).await?;
    authorize_role_update(&requester, &update)?;

    let target = TeamMembership::find(&state.db, team_id, user_id)
        .await?
        .ok_or_else(member_not_found)?;

    if !target.is_active {
        return Err(ApiError::BadRequest(
            "Cannot assign roles to an inactive member".to_string(),
        ));
    }

    let membership = TeamMembership::update_roles(&state.db, team_id, user_id, update)
        .await?
        .ok_or_else(member_not_found)?;

    tracing::info!(
        %team_id,
        %user_id,
        actor = %actor_id,
        is_team_lead = ?update.is_team_lead,
        is_fund_manager = ?update.is_fund_manager,
        is_food_manager = ?update.is_food_manager,
        "roles assigned"
    );

    Ok(ApiResponse::ok("Roles assigned successfully", membership))
}

/// Point the caller's current team at `team_id`
///
/// # Errors
///
/// - `403`: Caller isn't an active member
/// - `404`: No such team
pub async fn switch_team(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(team_id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<TeamSwitched>> {
    let team = find_team(&state, team_id).await?;
    require_active_member(&state.db, team_id, auth.user_id).await?;

    User::set_current_team(&state.db, auth.user_id, team_id).await?;

    tracing::debug!(%team_id, user_id = %auth.user_id, "current team switched");

    Ok(ApiResponse::ok(
        "Team switched successfully",
        TeamSwitched {
            current_team_id: team_id,
            team,
        },
    ))
}
