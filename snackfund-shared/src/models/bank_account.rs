/// Bank account model and database operations
///
/// Each member can register one bank account per team. The
/// `bank_accounts_team_id_user_id_key` constraint enforces this, so a
/// duplicate insert fails atomically instead of racing a prior lookup.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE bank_accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL,
///     user_id UUID NOT NULL,
///     bank_name VARCHAR(255) NOT NULL,
///     branch VARCHAR(255) NOT NULL,
///     account_no VARCHAR(64) NOT NULL,
///     account_title VARCHAR(255) NOT NULL,
///     routing_number VARCHAR(64) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT bank_accounts_team_id_user_id_key UNIQUE (team_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const BANK_ACCOUNT_COLUMNS: &str = "id, team_id, user_id, bank_name, branch, account_no, \
     account_title, routing_number, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: Uuid,
    pub team_id: Uuid,

    /// Account holder
    pub user_id: Uuid,

    pub bank_name: String,
    pub branch: String,

    /// Fixed once registered
    pub account_no: String,

    pub account_title: String,
    pub routing_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBankAccount {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub bank_name: String,
    pub branch: String,
    pub account_no: String,
    pub account_title: String,
    pub routing_number: String,
}

/// Editable bank account fields; the account number is not one of them
#[derive(Debug, Clone, Default)]
pub struct UpdateBankAccount {
    pub bank_name: Option<String>,
    pub branch: Option<String>,
    pub account_title: Option<String>,
    pub routing_number: Option<String>,
}

impl BankAccount {
    /// Registers a bank account
    ///
    /// # Errors
    ///
    /// Returns a `bank_accounts_team_id_user_id_key` violation if the user
    /// already has an account in this team.
    pub async fn create(pool: &PgPool, data: CreateBankAccount) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO bank_accounts
                (team_id, user_id, bank_name, branch, account_no, account_title, routing_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BANK_ACCOUNT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, BankAccount>(&query)
            .bind(data.team_id)
            .bind(data.user_id)
            .bind(data.bank_name)
            .bind(data.branch)
            .bind(data.account_no)
            .bind(data.account_title)
            .bind(data.routing_number)
            .fetch_one(pool)
            .await
    }

    pub async fn find_in_team(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {BANK_ACCOUNT_COLUMNS} FROM bank_accounts WHERE id = $1 AND team_id = $2"
        );

        sqlx::query_as::<_, BankAccount>(&query)
            .bind(id)
            .bind(team_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {BANK_ACCOUNT_COLUMNS} FROM bank_accounts WHERE team_id = $1 ORDER BY created_at ASC"
        );

        sqlx::query_as::<_, BankAccount>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
        data: UpdateBankAccount,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE bank_accounts
            SET bank_name = COALESCE($3, bank_name),
                branch = COALESCE($4, branch),
                account_title = COALESCE($5, account_title),
                routing_number = COALESCE($6, routing_number),
                updated_at = NOW()
            WHERE id = $1 AND team_id = $2
            RETURNING {BANK_ACCOUNT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, BankAccount>(&query)
            .bind(id)
            .bind(team_id)
            .bind(data.bank_name)
            .bind(data.branch)
            .bind(data.account_title)
            .bind(data.routing_number)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, team_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bank_accounts WHERE id = $1 AND team_id = $2")
            .bind(id)
            .bind(team_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
