/// Team-scoped authorization checks
///
/// Every predicate reads the caller's membership row fresh from the
/// database, so a role change takes effect on the very next request. There
/// is no permission cache.
///
/// # Permission Model
///
/// 1. **Membership**: the caller must have an active membership in the team
/// 2. **Role flags**: team lead, fund manager and food manager are
///    independent booleans on that membership
/// 3. **Role assignment**: granting or revoking a role requires being a team
///    lead, or already holding that same role (fund and food manager only)
///
/// # Example
///
/// ```no_run
/// use snackfund_shared::auth::authorization::require_fund_manager;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, team_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let membership = require_fund_manager(&pool, team_id, user_id).await?;
/// assert!(membership.is_fund_manager);
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{RoleUpdate, TeamMembership, TeamRole};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User has no membership in the team
    #[error("Not a member of team {0}")]
    NotMember(Uuid),

    /// User's membership in the team was deactivated
    #[error("Membership in team {0} is inactive")]
    Inactive(Uuid),

    /// User lacks a role the action needs
    #[error("Only a {required} can perform this action")]
    InsufficientRole { required: TeamRole },

    /// User may not grant or revoke this role
    #[error("You don't have permission to assign the {role} role")]
    RoleAssignmentDenied { role: TeamRole },

    /// Members can never deactivate their own membership
    #[error("You cannot deactivate yourself")]
    SelfDeactivation,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Loads the caller's membership and requires it to be active
///
/// # Errors
///
/// - `AuthzError::NotMember` if there is no membership row
/// - `AuthzError::Inactive` if the membership was deactivated
pub async fn require_active_member(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<TeamMembership, AuthzError> {
    let membership = TeamMembership::find(pool, team_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(team_id))?;

    if !membership.is_active {
        return Err(AuthzError::Inactive(team_id));
    }

    Ok(membership)
}

/// Requires an active membership holding `role`
///
/// # Returns
///
/// The caller's membership, so handlers can reuse it without a second read
pub async fn require_role(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
    role: TeamRole,
) -> Result<TeamMembership, AuthzError> {
    let membership = require_active_member(pool, team_id, user_id).await?;

    if !membership.has_role(role) {
        tracing::debug!(%team_id, %user_id, role = role.as_str(), "role check failed");
        return Err(AuthzError::InsufficientRole { required: role });
    }

    Ok(membership)
}

/// Requires the caller to be a team lead of `team_id`
pub async fn require_team_lead(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<TeamMembership, AuthzError> {
    require_role(pool, team_id, user_id, TeamRole::TeamLead).await
}

/// Requires the caller to be a fund manager of `team_id`
pub async fn require_fund_manager(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<TeamMembership, AuthzError> {
    require_role(pool, team_id, user_id, TeamRole::FundManager).await
}

/// Requires the caller to be a food manager of `team_id`
pub async fn require_food_manager(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<TeamMembership, AuthzError> {
    require_role(pool, team_id, user_id, TeamRole::FoodManager).await
}

/// Decides whether `requester` may apply `update`
///
/// | Role touched     | Allowed when requester is        |
/// |------------------|----------------------------------|
/// | `isTeamLead`     | team lead                        |
/// | `isFundManager`  | team lead or fund manager        |
/// | `isFoodManager`  | team lead or food manager        |
///
/// Every touched role must pass; the first failing one is reported.
///
/// # Example
///
/// ```
/// use snackfund_shared::auth::authorization::authorize_role_update;
/// # use snackfund_shared::models::membership::{RoleUpdate, TeamMembership};
/// # fn example(food_manager: &TeamMembership) {
/// let update = RoleUpdate { is_food_manager: Some(true), ..Default::default() };
/// assert!(authorize_role_update(food_manager, &update).is_ok());
///
/// let update = RoleUpdate { is_team_lead: Some(true), ..Default::default() };
/// assert!(authorize_role_update(food_manager, &update).is_err());
/// # }
/// ```
pub fn authorize_role_update(
    requester: &TeamMembership,
    update: &RoleUpdate,
) -> Result<(), AuthzError> {
    let is_lead = requester.has_role(TeamRole::TeamLead);

    for role in update.touched_roles() {
        let allowed = match role {
            TeamRole::TeamLead => is_lead,
            TeamRole::FundManager | TeamRole::FoodManager => is_lead || requester.has_role(role),
        };

        if !allowed {
            return Err(AuthzError::RoleAssignmentDenied { role });
        }
    }

    Ok(())
}

/// Rejects an actor deactivating their own membership
pub fn ensure_not_self(actor_id: Uuid, target_user_id: Uuid) -> Result<(), AuthzError> {
    if actor_id == target_user_id {
        return Err(AuthzError::SelfDeactivation);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn requester(lead: bool, fund: bool, food: bool) -> TeamMembership {
        TeamMembership {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            is_team_lead: lead,
            is_fund_manager: fund,
            is_food_manager: food,
            is_active: true,
            joined_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn grant(role: TeamRole) -> RoleUpdate {
        let mut update = RoleUpdate::default();
        match role {
            TeamRole::TeamLead => update.is_team_lead = Some(true),
            TeamRole::FundManager => update.is_fund_manager = Some(true),
            TeamRole::FoodManager => update.is_food_manager = Some(true),
        }
        update
    }

    #[test]
    fn test_team_lead_can_assign_every_role() {
        let lead = requester(true, false, false);

        assert!(authorize_role_update(&lead, &grant(TeamRole::TeamLead)).is_ok());
        assert!(authorize_role_update(&lead, &grant(TeamRole::FundManager)).is_ok());
        assert!(authorize_role_update(&lead, &grant(TeamRole::FoodManager)).is_ok());
    }

    #[test]
    fn test_role_holder_can_assign_only_own_role() {
        let fund = requester(false, true, false);
        assert!(authorize_role_update(&fund, &grant(TeamRole::FundManager)).is_ok());
        assert!(matches!(
            authorize_role_update(&fund, &grant(TeamRole::FoodManager)),
            Err(AuthzError::RoleAssignmentDenied { role: TeamRole::FoodManager })
        ));
        assert!(authorize_role_update(&fund, &grant(TeamRole::TeamLead)).is_err());

        let food = requester(false, false, true);
        assert!(authorize_role_update(&food, &grant(TeamRole::FoodManager)).is_ok());
        assert!(authorize_role_update(&food, &grant(TeamRole::FundManager)).is_err());
    }

    #[test]
    fn test_plain_member_cannot_assign_anything() {
        let member = requester(false, false, false);

        for role in [TeamRole::TeamLead, TeamRole::FundManager, TeamRole::FoodManager] {
            assert!(authorize_role_update(&member, &grant(role)).is_err());
        }
    }

    #[test]
    fn test_mixed_update_fails_on_any_denied_role() {
        let fund = requester(false, true, false);
        let update = RoleUpdate {
            is_fund_manager: Some(false),
            is_team_lead: Some(true),
            ..Default::default()
        };

        assert!(matches!(
            authorize_role_update(&fund, &update),
            Err(AuthzError::RoleAssignmentDenied { role: TeamRole::TeamLead })
        ));
    }

    #[test]
    fn test_inactive_lead_cannot_assign() {
        let mut lead = requester(true, true, true);
        lead.is_active = false;

        assert!(authorize_role_update(&lead, &grant(TeamRole::FundManager)).is_err());
    }

    #[test]
    fn test_ensure_not_self() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(ensure_not_self(a, b).is_ok());
        assert!(matches!(ensure_not_self(a, a), Err(AuthzError::SelfDeactivation)));
    }

    #[test]
    fn test_error_messages() {
        let err = AuthzError::InsufficientRole { required: TeamRole::FoodManager };
        assert_eq!(err.to_string(), "Only a food manager can perform this action");

        let err = AuthzError::RoleAssignmentDenied { role: TeamRole::TeamLead };
        assert_eq!(err.to_string(), "You don't have permission to assign the team lead role");
    }
}
