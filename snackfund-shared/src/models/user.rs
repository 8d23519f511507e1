/// User model and database operations
///
/// Users carry their credentials, profile, password reset state and a weak
/// pointer to the team their ledger requests currently operate on.
///
/// `User` itself is never serialized. Everything that leaves the service
/// goes through [`PublicUser`], which has no password or reset fields.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     full_name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,          -- unique, lowercase
///     phone VARCHAR(32) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     dob DATE NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     reset_token_hash VARCHAR(64),
///     reset_token_expiry TIMESTAMPTZ,
///     current_team_id UUID,                 -- no foreign key
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use snackfund_shared::models::user::{User, CreateUser};
/// use snackfund_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::NaiveDate;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     full_name: "Ana Lima".to_string(),
///     email: "Ana@Example.com".to_string(),
///     phone: "+1 555 010 2030".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     dob: NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
/// }).await?;
///
/// assert_eq!(user.email, "ana@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Minimum age, in whole years, required to hold an account
pub const MIN_AGE_YEARS: i32 = 18;

const USER_COLUMNS: &str = "id, full_name, email, phone, password_hash, dob, is_active, \
     reset_token_hash, reset_token_expiry, current_team_id, created_at, updated_at";

const PUBLIC_USER_COLUMNS: &str =
    "id, full_name, email, phone, dob, is_active, current_team_id, created_at, updated_at";

/// User account as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Full display name
    pub full_name: String,

    /// Email address, always lowercase
    pub email: String,

    /// Contact phone number
    pub phone: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    /// Date of birth
    pub dob: NaiveDate,

    /// Deactivated accounts cannot sign in
    pub is_active: bool,

    /// SHA-256 digest of the outstanding reset token, if any
    pub reset_token_hash: Option<String>,

    /// When the outstanding reset token stops being accepted
    pub reset_token_expiry: Option<DateTime<Utc>>,

    /// Team that ledger requests operate on
    pub current_team_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user
///
/// This is the only user shape that is ever serialized into a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub is_active: bool,
    pub current_team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            dob: user.dob,
            is_active: user.is_active,
            current_team_id: user.current_team_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub full_name: String,

    /// Email address (normalized to lowercase on insert)
    pub email: String,

    pub phone: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    pub dob: NaiveDate,
}

/// Input for updating a profile
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a database error carrying the `users_email_key` constraint if
    /// the email is already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (full_name, email, phone, password_hash, dob)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.full_name.trim())
            .bind(normalize_email(&data.email))
            .bind(data.phone.trim())
            .bind(data.password_hash)
            .bind(data.dob)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email, case-insensitively
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use snackfund_shared::models::user::User;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// if let Some(user) = User::find_by_email(&pool, "ANA@example.com").await? {
    ///     println!("Found user: {}", user.id);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Loads the public profiles for a set of user IDs in one round-trip
    ///
    /// IDs that no longer resolve are silently absent from the result.
    pub async fn find_public_by_ids(
        pool: &PgPool,
        ids: &[Uuid],
    ) -> Result<Vec<PublicUser>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {PUBLIC_USER_COLUMNS} FROM users WHERE id = ANY($1)");

        sqlx::query_as::<_, PublicUser>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Updates profile fields
    ///
    /// # Returns
    ///
    /// The updated user, or `None` if the user doesn't exist
    ///
    /// # Errors
    ///
    /// Returns a `users_email_key` violation if the new email is taken.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(data.full_name.as_deref().map(str::trim))
            .bind(data.email.as_deref().map(normalize_email))
            .bind(data.phone.as_deref().map(str::trim))
            .bind(data.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Points the user at a team, overwriting whatever was there
    ///
    /// Takes any executor so it can join the team-creation transaction.
    pub async fn set_current_team<'e, E>(
        executor: E,
        id: Uuid,
        team_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE users SET current_team_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(team_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Points the user at a team only if no team is selected yet
    pub async fn set_current_team_if_unset(
        pool: &PgPool,
        id: Uuid,
        team_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET current_team_id = $2, updated_at = NOW()
            WHERE id = $1 AND current_team_id IS NULL
            "#,
        )
        .bind(id)
        .bind(team_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores a reset token digest and its expiry, replacing any earlier one
    pub async fn set_reset_token(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = $2, reset_token_expiry = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the password and clears the reset token in one statement
    ///
    /// The update only applies while the stored digest still equals
    /// `token_hash`, so two concurrent resets with the same token cannot both
    /// succeed.
    ///
    /// # Returns
    ///
    /// True if the password was changed
    pub async fn complete_password_reset(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $3,
                reset_token_hash = NULL,
                reset_token_expiry = NULL,
                updated_at = NOW()
            WHERE id = $1 AND reset_token_hash = $2
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(new_password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Lowercases and trims an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Whole years between `dob` and `today`
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

/// Checks a phone number: at least 10 characters of digits, spaces, `-+()`
pub fn is_valid_phone(phone: &str) -> bool {
    phone.chars().count() >= 10
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '(' | ')') || c.is_whitespace())
}
