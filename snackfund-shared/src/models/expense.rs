/// Expense model and database operations
///
/// An expense is money a team member spent on the team's behalf. Every
/// query is filtered by `team_id`, so a record from another team behaves
/// exactly like a missing one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE expenses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL,
///     user_id UUID NOT NULL,
///     amount DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
///     reason TEXT NOT NULL,
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
/// use snackfund_shared::models::expense::{CreateExpense, Expense};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, team_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let expense = Expense::create(&pool, CreateExpense {
///     team_id,
///     user_id,
///     amount: 12.5,
///     reason: "Coffee beans".to_string(),
///     note: None,
///     date: None,
/// }).await?;
///
/// let mine = Expense::list_by_user(&pool, team_id, user_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const EXPENSE_COLUMNS: &str =
    "id, team_id, user_id, amount, reason, note, date, created_at, updated_at";

/// Expense record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub team_id: Uuid,

    /// Member the expense belongs to
    pub user_id: Uuid,

    pub amount: f64,
    pub reason: String,
    pub note: Option<String>,

    /// When the money was spent
    pub date: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording an expense
#[derive(Debug, Clone)]
pub struct CreateExpense {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub reason: String,
    pub note: Option<String>,

    /// Defaults to now
    pub date: Option<DateTime<Utc>>,
}

/// Partial expense update
#[derive(Debug, Clone, Default)]
pub struct UpdateExpense {
    pub amount: Option<f64>,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl Expense {
    /// Records an expense
    pub async fn create(pool: &PgPool, data: CreateExpense) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO expenses (team_id, user_id, amount, reason, note, date)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()))
            RETURNING {EXPENSE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Expense>(&query)
            .bind(data.team_id)
            .bind(data.user_id)
            .bind(data.amount)
            .bind(data.reason)
            .bind(data.note)
            .bind(data.date)
            .fetch_one(pool)
            .await
    }

    /// Finds an expense within a team
    ///
    /// # Returns
    ///
    /// `None` if the expense doesn't exist or belongs to another team
    pub async fn find_in_team(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 AND team_id = $2");

        sqlx::query_as::<_, Expense>(&query)
            .bind(id)
            .bind(team_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a team's expenses, newest first
    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE team_id = $1 ORDER BY date DESC"
        );

        sqlx::query_as::<_, Expense>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await
    }

    /// Lists one member's expenses within a team, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {EXPENSE_COLUMNS} FROM expenses
            WHERE team_id = $1 AND user_id = $2
            ORDER BY date DESC
            "#
        );

        sqlx::query_as::<_, Expense>(&query)
            .bind(team_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Updates an expense within a team
    ///
    /// # Returns
    ///
    /// The updated expense, or `None` if it isn't in the team
    pub async fn update(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
        data: UpdateExpense,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE expenses
            SET amount = COALESCE($3, amount),
                reason = COALESCE($4, reason),
                note = COALESCE($5, note),
                date = COALESCE($6, date),
                updated_at = NOW()
            WHERE id = $1 AND team_id = $2
            RETURNING {EXPENSE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Expense>(&query)
            .bind(id)
            .bind(team_id)
            .bind(data.amount)
            .bind(data.reason)
            .bind(data.note)
            .bind(data.date)
            .fetch_optional(pool)
            .await
    }

    /// Deletes an expense within a team
    ///
    /// # Returns
    ///
    /// True if a row was deleted; a second delete returns false
    pub async fn delete(pool: &PgPool, team_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND team_id = $2")
            .bind(id)
            .bind(team_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
