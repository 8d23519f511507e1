/// Team membership model and database operations
///
/// A membership joins one user to one team and carries three independent
/// role flags plus an active flag. There is at most one row per
/// (team, user); rows are never deleted, only deactivated.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE team_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL REFERENCES teams(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     is_team_lead BOOLEAN NOT NULL DEFAULT FALSE,
///     is_fund_manager BOOLEAN NOT NULL DEFAULT FALSE,
///     is_food_manager BOOLEAN NOT NULL DEFAULT FALSE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT team_members_team_id_user_id_key UNIQUE (team_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **team lead**: adds and deactivates members, grants any role
/// - **fund manager**: bank accounts, expenses, payments, rules, violations
/// - **food manager**: snack records
///
/// # Example
///
/// ```no_run
/// use snackfund_shared::models::membership::{CreateMembership, TeamMembership, TeamRole};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, team_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let membership = TeamMembership::create(&pool, CreateMembership::member(team_id, user_id)).await?;
/// assert!(!membership.has_role(TeamRole::TeamLead));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const MEMBERSHIP_COLUMNS: &str = "id, team_id, user_id, is_team_lead, is_fund_manager, \
     is_food_manager, is_active, joined_at, created_at, updated_at";

/// Roles a membership can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeamRole {
    TeamLead,
    FundManager,
    FoodManager,
}

impl TeamRole {
    /// Converts role to string for display and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::TeamLead => "team lead",
            TeamRole::FundManager => "fund manager",
            TeamRole::FoodManager => "food manager",
        }
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembership {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub is_team_lead: bool,
    pub is_fund_manager: bool,
    pub is_food_manager: bool,

    /// Inactive memberships grant nothing; deactivation is terminal
    pub is_active: bool,

    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamMembership {
    /// True if the membership is active and holds `role`
    pub fn has_role(&self, role: TeamRole) -> bool {
        self.is_active
            && match role {
                TeamRole::TeamLead => self.is_team_lead,
                TeamRole::FundManager => self.is_fund_manager,
                TeamRole::FoodManager => self.is_food_manager,
            }
    }
}

/// Input for creating a membership
#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub is_team_lead: bool,
    pub is_fund_manager: bool,
    pub is_food_manager: bool,
}

impl CreateMembership {
    /// Membership for a team's creator: every role
    pub fn founder(team_id: Uuid, user_id: Uuid) -> Self {
        Self {
            team_id,
            user_id,
            is_team_lead: true,
            is_fund_manager: true,
            is_food_manager: true,
        }
    }

    /// Membership for an added member: no roles
    pub fn member(team_id: Uuid, user_id: Uuid) -> Self {
        Self {
            team_id,
            user_id,
            is_team_lead: false,
            is_fund_manager: false,
            is_food_manager: false,
        }
    }
}

/// Partial role assignment
///
/// `None` leaves a flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdate {
    pub is_team_lead: Option<bool>,
    pub is_fund_manager: Option<bool>,
    pub is_food_manager: Option<bool>,
}

impl RoleUpdate {
    /// True when no flag is being set
    pub fn is_empty(&self) -> bool {
        self.is_team_lead.is_none() && self.is_fund_manager.is_none() && self.is_food_manager.is_none()
    }

    /// Roles this update touches, whether granting or revoking
    pub fn touched_roles(&self) -> Vec<TeamRole> {
        let mut roles = Vec::with_capacity(3);
        if self.is_team_lead.is_some() {
            roles.push(TeamRole::TeamLead);
        }
        if self.is_fund_manager.is_some() {
            roles.push(TeamRole::FundManager);
        }
        if self.is_food_manager.is_some() {
            roles.push(TeamRole::FoodManager);
        }
        roles
    }
}

impl TeamMembership {
    /// Creates a membership
    ///
    /// Takes any executor so team creation can seed the founder inside its
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns a `team_members_team_id_user_id_key` violation if the user is
    /// already on the team, or a foreign key violation if either side is
    /// missing.
    pub async fn create<'e, E>(executor: E, data: CreateMembership) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            INSERT INTO team_members (team_id, user_id, is_team_lead, is_fund_manager, is_food_manager)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        );

        sqlx::query_as::<_, TeamMembership>(&query)
            .bind(data.team_id)
            .bind(data.user_id)
            .bind(data.is_team_lead)
            .bind(data.is_fund_manager)
            .bind(data.is_food_manager)
            .fetch_one(executor)
            .await
    }

    /// Finds the membership for a (team, user) pair
    ///
    /// Returns inactive rows too; callers decide what inactivity means.
    pub async fn find(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM team_members WHERE team_id = $1 AND user_id = $2"
        );

        sqlx::query_as::<_, TeamMembership>(&query)
            .bind(team_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Checks if a user has an active membership in a team
    pub async fn is_active_member(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM team_members
                WHERE team_id = $1 AND user_id = $2 AND is_active
            )
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Lists a team's memberships in join order
    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM team_members WHERE team_id = $1 ORDER BY joined_at ASC"
        );

        sqlx::query_as::<_, TeamMembership>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await
    }

    /// Lists a user's memberships across all teams
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM team_members WHERE user_id = $1 ORDER BY joined_at ASC"
        );

        sqlx::query_as::<_, TeamMembership>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Applies a partial role assignment
    ///
    /// # Returns
    ///
    /// The updated membership, or `None` if the pair has no membership
    pub async fn update_roles(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
        update: RoleUpdate,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE team_members
            SET is_team_lead = COALESCE($3, is_team_lead),
                is_fund_manager = COALESCE($4, is_fund_manager),
                is_food_manager = COALESCE($5, is_food_manager),
                updated_at = NOW()
            WHERE team_id = $1 AND user_id = $2
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        );

        sqlx::query_as::<_, TeamMembership>(&query)
            .bind(team_id)
            .bind(user_id)
            .bind(update.is_team_lead)
            .bind(update.is_fund_manager)
            .bind(update.is_food_manager)
            .fetch_optional(pool)
            .await
    }

    /// Deactivates a membership
    ///
    /// # Returns
    ///
    /// The updated membership, or `None` if the pair has no membership
    pub async fn deactivate(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE team_members
            SET is_active = FALSE, updated_at = NOW()
            WHERE team_id = $1 AND user_id = $2
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        );

        sqlx::query_as::<_, TeamMembership>(&query)
            .bind(team_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
