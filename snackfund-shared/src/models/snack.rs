/// Snack event model and database operations
///
/// A snack event records a food purchase, what it cost, and how much each
/// member chipped in. Contributions are stored inline as JSONB.
///
/// `total_contribution` is always the sum of the contribution amounts. It is
/// computed here on insert and recomputed whenever an update replaces the
/// contribution list, so callers never supply it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE snacks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL,
///     contributions JSONB NOT NULL,         -- [{"userId": ..., "amount": ...}]
///     total_contribution DOUBLE PRECISION NOT NULL,
///     food_item VARCHAR(255) NOT NULL,
///     expense DOUBLE PRECISION NOT NULL CHECK (expense >= 0),
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
/// use snackfund_shared::models::snack::{Contribution, CreateSnack, Snack};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, team_id: Uuid, u1: Uuid, u2: Uuid) -> Result<(), sqlx::Error> {
/// let snack = Snack::create(&pool, CreateSnack {
///     team_id,
///     contributions: vec![
///         Contribution { user_id: u1, amount: 5.0 },
///         Contribution { user_id: u2, amount: 7.0 },
///     ],
///     food_item: "Samosas".to_string(),
///     expense: 12.0,
///     note: None,
///     date: None,
/// }).await?;
///
/// assert_eq!(snack.total_contribution, 12.0);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

const SNACK_COLUMNS: &str = "id, team_id, contributions, total_contribution, food_item, expense, \
     note, date, created_at, updated_at";

/// One member's share of a snack purchase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub user_id: Uuid,
    pub amount: f64,
}

/// Sum of contribution amounts
pub fn total_contribution(contributions: &[Contribution]) -> f64 {
    contributions.iter().map(|c| c.amount).sum()
}

/// Snack event record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Snack {
    pub id: Uuid,
    pub team_id: Uuid,
    pub contributions: Json<Vec<Contribution>>,

    /// Always equals the sum of `contributions`
    pub total_contribution: f64,

    pub food_item: String,

    /// What the food actually cost
    pub expense: f64,

    pub note: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snack {
    /// Distinct contributor IDs, in first-seen order
    pub fn contributor_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::with_capacity(self.contributions.len());
        for c in self.contributions.iter() {
            if !ids.contains(&c.user_id) {
                ids.push(c.user_id);
            }
        }
        ids
    }
}

/// Input for recording a snack event
#[derive(Debug, Clone)]
pub struct CreateSnack {
    pub team_id: Uuid,
    pub contributions: Vec<Contribution>,
    pub food_item: String,
    pub expense: f64,
    pub note: Option<String>,

    /// Defaults to now
    pub date: Option<DateTime<Utc>>,
}

/// Partial snack update
///
/// Replacing `contributions` recomputes the total.
#[derive(Debug, Clone, Default)]
pub struct UpdateSnack {
    pub contributions: Option<Vec<Contribution>>,
    pub food_item: Option<String>,
    pub expense: Option<f64>,
    pub note: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl Snack {
    /// Records a snack event and derives its total
    pub async fn create(pool: &PgPool, data: CreateSnack) -> Result<Self, sqlx::Error> {
        let total = total_contribution(&data.contributions);
        let query = format!(
            r#"
            INSERT INTO snacks (team_id, contributions, total_contribution, food_item, expense, note, date)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()))
            RETURNING {SNACK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Snack>(&query)
            .bind(data.team_id)
            .bind(Json(data.contributions))
            .bind(total)
            .bind(data.food_item)
            .bind(data.expense)
            .bind(data.note)
            .bind(data.date)
            .fetch_one(pool)
            .await
    }

    /// Finds a snack event within a team
    pub async fn find_in_team(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {SNACK_COLUMNS} FROM snacks WHERE id = $1 AND team_id = $2");

        sqlx::query_as::<_, Snack>(&query)
            .bind(id)
            .bind(team_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a team's snack events, newest first
    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query =
            format!("SELECT {SNACK_COLUMNS} FROM snacks WHERE team_id = $1 ORDER BY date DESC");

        sqlx::query_as::<_, Snack>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await
    }

    /// Lists snack events dated within `[start, end]`, newest first
    pub async fn list_by_date_range(
        pool: &PgPool,
        team_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {SNACK_COLUMNS} FROM snacks
            WHERE team_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date DESC
            "#
        );

        sqlx::query_as::<_, Snack>(&query)
            .bind(team_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Updates a snack event within a team
    ///
    /// # Returns
    ///
    /// The updated snack, or `None` if it isn't in the team
    pub async fn update(
        pool: &PgPool,
        team_id: Uuid,
        id: Uuid,
        data: UpdateSnack,
    ) -> Result<Option<Self>, sqlx::Error> {
        let total = data.contributions.as_deref().map(total_contribution);
        let query = format!(
            r#"
            UPDATE snacks
            SET contributions = COALESCE($3, contributions),
                total_contribution = COALESCE($4, total_contribution),
                food_item = COALESCE($5, food_item),
                expense = COALESCE($6, expense),
                note = COALESCE($7, note),
                date = COALESCE($8, date),
                updated_at = NOW()
            WHERE id = $1 AND team_id = $2
            RETURNING {SNACK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Snack>(&query)
            .bind(id)
            .bind(team_id)
            .bind(data.contributions.map(Json))
            .bind(total)
            .bind(data.food_item)
            .bind(data.expense)
            .bind(data.note)
            .bind(data.date)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a snack event within a team
    pub async fn delete(pool: &PgPool, team_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM snacks WHERE id = $1 AND team_id = $2")
            .bind(id)
            .bind(team_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_contribution() {
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();

        let contributions = [
            Contribution { user_id: u1, amount: 5.0 },
            Contribution { user_id: u2, amount: 7.0 },
        ];

        assert_eq!(total_contribution(&contributions), 12.0);
        assert_eq!(total_contribution(&[]), 0.0);
    }

    #[test]
    fn test_contributor_ids_are_distinct() {
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();
        let snack = Snack {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            contributions: Json(vec![
                Contribution { user_id: u1, amount: 1.0 },
                Contribution { user_id: u2, amount: 2.0 },
                Contribution { user_id: u1, amount: 3.0 },
            ]),
            total_contribution: 6.0,
            food_item: "Donuts".to_string(),
            expense: 6.0,
            note: None,
            date: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(snack.contributor_ids(), vec![u1, u2]);
    }

    #[test]
    fn test_snack_serializes_contributions_inline() {
        let user = Uuid::new_v4();
        let snack = Snack {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            contributions: Json(vec![Contribution { user_id: user, amount: 4.5 }]),
            total_contribution: 4.5,
            food_item: "Chips".to_string(),
            expense: 4.5,
            note: Some("Friday".to_string()),
            date: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&snack).unwrap();
        assert_eq!(json["contributions"][0]["userId"], user.to_string());
        assert_eq!(json["contributions"][0]["amount"], 4.5);
        assert_eq!(json["totalContribution"], 4.5);
        assert_eq!(json["foodItem"], "Chips");
    }
}
