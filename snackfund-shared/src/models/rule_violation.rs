/// Rule violation model and database operations
///
/// A violation fines one member for breaking one of the team's rules. The
/// fine is the rule's amount plus `additional_amount`. `updated_by` records
/// the last fund manager who touched the row and is overwritten on every
/// update; it is not a history.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE rule_violations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL,
///     violator_id UUID NOT NULL,
///     rule_id UUID NOT NULL,
///     additional_amount DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (additional_amount >= 0),
///     updated_by UUID NOT NULL,
///     note TEXT,
///     date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use snackfund_shared::models::rule_violation::{CreateRuleViolation, RuleViolation};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, team_id: Uuid, rule_id: Uuid, violator: Uuid, manager: Uuid) -> Result<(), sqlx::Error> {
/// RuleViolation::create(&pool, CreateRuleViolation {
///     team_id,
///     violator_id: violator,
///     rule_id,
///     additional_amount: 0.0,
///     updated_by: manager,
///     note: Some("Late to standup".to_string()),
///     date: None,
/// }).await?;
///
/// let fines = RuleViolation::list_by_violator(&pool, team_id, violator).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const VIOLATION_COLUMNS: &str = "id, team_id, violator_id, rule_id, additional_amount, \
     updated_by, note, date, created_at, updated_at";

/// Rule violation record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub id: Uuid,
    pub team_id: Uuid,

    /// Member being fined
    pub violator_id: Uuid,

    /// Rule that was broken
    pub rule_id: Uuid,

    /// Charged on top of the rule's base amount
    pub additional_amount: f64,

    /// Last user to create or edit this violation
    pub updated_by: Uuid,

    pub note: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a violation
#[derive(Debug, Clone)]
pub struct CreateRuleViolation {
    pub team_id: Uuid,
    pub violator_id: Uuid,
    pub rule_id: Uuid,
    pub additional_amount: f64,
    pub updated_by: Uuid,
    pub note: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Partial update; `updated_by` is always written
#[derive(Debug, Clone)]
pub struct UpdateRuleViolation {
    pub updated_by: Uuid,
    pub violator_id: Option<Uuid>,
    pub rule_id: Option<Uuid>,
    pub additional_amount: Option<f64>,
    pub note: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl RuleViolation {
    /// Records a violation
    pub async fn create(pool: &PgPool, data: CreateRuleViolation) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO rule_violations
                (team_id, violator_id, rule_id, additional_amount, updated_by, note, date)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()))
            RETURNING {VIOLATION_COLUMNS}
            "#
        );

        sqlx::query_as::<_, RuleViolation>(&query)
            .bind(data.team_id)
            .bind(data.violator_id)
            .bind(data.rule_id)
            .bind(data.additional_amount)
            .bind(data.updated_by)
            .bind(data.note)
            .bind(data.date)
            .fetch_one(pool)
            .await
    }

    /// Finds a violation within a team
    pub async fn find_in_team(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {VIOLATION_COLUMNS} FROM rule_violations WHERE id = $1 AND team_id = $2"
        );

        sqlx::query_as::<_, RuleViolation>(&query)
            .bind(id)
            .bind(team_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a team's violations, newest first
    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {VIOLATION_COLUMNS} FROM rule_violations WHERE team_id = $1 ORDER BY date DESC"
        );

        sqlx::query_as::<_, RuleViolation>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await
    }

    /// Lists the violations charged to one member, newest first
    pub async fn list_by_violator(
        pool: &PgPool,
        team_id: Uuid,
        violator_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {VIOLATION_COLUMNS} FROM rule_violations
            WHERE team_id = $1 AND violator_id = $2
            ORDER BY date DESC
            "#
        );

        sqlx::query_as::<_, RuleViolation>(&query)
            .bind(team_id)
            .bind(violator_id)
            .fetch_all(pool)
            .await
    }

    /// Lists the violations of one rule, newest first
    pub async fn list_by_rule(
        pool: &PgPool,
        team_id: Uuid,
        rule_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {VIOLATION_COLUMNS} FROM rule_violations
            WHERE team_id = $1 AND rule_id = $2
            ORDER BY date DESC
            "#
        );

        sqlx::query_as::<_, RuleViolation>(&query)
            .bind(team_id)
            .bind(rule_id)
            .fetch_all(pool)
            .await
    }

    /// Updates a violation within a team and stamps the editor
    ///
    /// # Returns
    ///
    /// The updated violation, or `None` if it isn't in the team
    pub async fn update(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
        data: UpdateRuleViolation,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE rule_violations
            SET updated_by = $3,
                violator_id = COALESCE($4, violator_id),
                rule_id = COALESCE($5, rule_id),
                additional_amount = COALESCE($6, additional_amount),
                note = COALESCE($7, note),
                date = COALESCE($8, date),
                updated_at = NOW()
            WHERE id = $1 AND team_id = $2
            RETURNING {VIOLATION_COLUMNS}
            "#
        );

        sqlx::query_as::<_, RuleViolation>(&query)
            .bind(id)
            .bind(team_id)
            .bind(data.updated_by)
            .bind(data.violator_id)
            .bind(data.rule_id)
            .bind(data.additional_amount)
            .bind(data.note)
            .bind(data.date)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a violation within a team
    pub async fn delete(pool: &PgPool, team_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rule_violations WHERE id = $1 AND team_id = $2")
            .bind(id)
            .bind(team_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
