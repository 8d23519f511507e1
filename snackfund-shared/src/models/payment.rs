/// Payment model and database operations
///
/// A payment is money a member paid into the shared fund. Amounts are
/// strictly positive; the table enforces it with a CHECK constraint as well.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL,
///     payed_by UUID NOT NULL,
///     amount DOUBLE PRECISION NOT NULL CHECK (amount > 0),
///     note TEXT,
///     date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "id, team_id, payed_by, amount, note, date, created_at, updated_at";

/// Payment record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub team_id: Uuid,

    /// Member who paid
    pub payed_by: Uuid,

    pub amount: f64,
    pub note: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub team_id: Uuid,
    pub payed_by: Uuid,
    pub amount: f64,
    pub note: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePayment {
    pub payed_by: Option<Uuid>,
    pub amount: Option<f64>,
    pub note: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl Payment {
    /// Records a payment
    pub async fn create(pool: &PgPool, data: CreatePayment) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO payments (team_id, payed_by, amount, note, date)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()))
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(data.team_id)
            .bind(data.payed_by)
            .bind(data.amount)
            .bind(data.note)
            .bind(data.date)
            .fetch_one(pool)
            .await
    }

    pub async fn find_in_team(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND team_id = $2");

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(team_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a team's payments, newest first
    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE team_id = $1 ORDER BY date DESC"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await
    }

    /// Lists payments one member made within a team, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE team_id = $1 AND payed_by = $2
            ORDER BY date DESC
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(team_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
        data: UpdatePayment,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE payments
            SET payed_by = COALESCE($3, payed_by),
                amount = COALESCE($4, amount),
                note = COALESCE($5, note),
                date = COALESCE($6, date),
                updated_at = NOW()
            WHERE id = $1 AND team_id = $2
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(team_id)
            .bind(data.payed_by)
            .bind(data.amount)
            .bind(data.note)
            .bind(data.date)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, team_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1 AND team_id = $2")
            .bind(id)
            .bind(team_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
