/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: signup, signin, password reset, current user
/// - `users`: profile updates
/// - `teams`: teams, membership and team switching
/// - `bank_accounts`, `expenses`, `payments`, `rules`, `rule_violations`:
///   fund manager ledger
/// - `snacks`: food manager ledger
///
/// Ledger handlers share one shape: resolve the caller's current team,
/// check the role, validate, run the team-scoped query, then attach the
/// referenced users' public profiles with a single batched lookup.

pub mod auth;
pub mod bank_accounts;
pub mod expenses;
pub mod health;
pub mod payments;
pub mod rule_violations;
pub mod rules;
pub mod snacks;
pub mod teams;
pub mod users;
pub mod validation;

use crate::error::ApiResult;
use snackfund_shared::models::user::{PublicUser, User};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Loads public profiles for every referenced user in one query
///
/// Duplicates are collapsed; unknown IDs are simply missing from the map.
pub(crate) async fn load_users<I>(pool: &PgPool, ids: I) -> ApiResult<HashMap<Uuid, PublicUser>>
where
    I: IntoIterator<Item = Uuid>,
{
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();

    let users = User::find_public_by_ids(pool, &ids).await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}
