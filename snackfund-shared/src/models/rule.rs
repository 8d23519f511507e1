/// Team rule model
///
/// A rule names a behavior the team fines, and the base fine amount.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE rules (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     amount DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const RULE_COLUMNS: &str = "id, team_id, title, amount, description, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: Uuid,
    pub team_id: Uuid,
    pub title: String,

    /// Base fine charged per violation
    pub amount: f64,

    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateRule {
    pub team_id: Uuid,
    pub title: String,
    pub amount: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRule {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
}

impl Rule {
    pub async fn create(pool: &PgPool, data: CreateRule) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO rules (team_id, title, amount, description)
            VALUES ($1, $2, $3, $4)
            RETURNING {RULE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Rule>(&query)
            .bind(data.team_id)
            .bind(data.title)
            .bind(data.amount)
            .bind(data.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_in_team(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {RULE_COLUMNS} FROM rules WHERE id = $1 AND team_id = $2");

        sqlx::query_as::<_, Rule>(&query)
            .bind(id)
            .bind(team_id)
            .fetch_optional(pool)
            .await
    }

    /// Loads several rules of one team at once
    pub async fn find_many_in_team(
        pool: &PgPool,
        team_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query =
            format!("SELECT {RULE_COLUMNS} FROM rules WHERE team_id = $1 AND id = ANY($2)");

        sqlx::query_as::<_, Rule>(&query)
            .bind(team_id)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Lists a team's rules, most recently created first
    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {RULE_COLUMNS} FROM rules WHERE team_id = $1 ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Rule>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
        data: UpdateRule,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE rules
            SET title = COALESCE($3, title),
                amount = COALESCE($4, amount),
                description = COALESCE($5, description),
                updated_at = NOW()
            WHERE id = $1 AND team_id = $2
            RETURNING {RULE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Rule>(&query)
            .bind(id)
            .bind(team_id)
            .bind(data.title)
            .bind(data.amount)
            .bind(data.description)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, team_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rules WHERE id = $1 AND team_id = $2")
            .bind(id)
            .bind(team_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
