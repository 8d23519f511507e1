/// Team model and database operations
///
/// A team is the unit every ledger record is scoped to. Team names are
/// globally unique and a team is never deleted; its creator is fixed at
/// creation time.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_name VARCHAR(255) NOT NULL,
///     description TEXT,
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT teams_team_name_key UNIQUE (team_name)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use snackfund_shared::models::team::{Team, CreateTeam};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, creator: Uuid) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// let team = Team::create(&mut *tx, CreateTeam {
///     team_name: "Alpha".to_string(),
///     description: Some("Fourth floor".to_string()),
///     created_by: creator,
/// }).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Team record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,

    /// Globally unique display name
    pub team_name: String,

    pub description: Option<String>,

    /// User who created the team (immutable)
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a team
#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub team_name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
}

impl Team {
    /// Inserts a team
    ///
    /// # Errors
    ///
    /// Returns a `teams_team_name_key` violation if the name is taken.
    pub async fn create<'e, E>(executor: E, data: CreateTeam) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (team_name, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, team_name, description, created_by, created_at, updated_at
            "#,
        )
        .bind(data.team_name.trim())
        .bind(data.description)
        .bind(data.created_by)
        .fetch_one(executor)
        .await
    }

    /// Finds a team by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT id, team_name, description, created_by, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists every team the user has a membership in, active or not
    ///
    /// Ordered by when the user joined, oldest first.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.team_name, t.description, t.created_by, t.created_at, t.updated_at
            FROM teams t
            JOIN team_members m ON m.team_id = t.id
            WHERE m.user_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_serializes_camel_case() {
        let team = Team {
            id: Uuid::new_v4(),
            team_name: "Alpha".to_string(),
            description: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&team).unwrap();
        assert_eq!(json["teamName"], "Alpha");
        assert!(json.get("createdBy").is_some());
    }
}
