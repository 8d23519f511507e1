/// Snack event endpoints
///
/// A snack event records a food purchase and who chipped in for it. The
/// total contribution is derived from the contribution list and never taken
/// from the client. Writes need the food manager role.
///
/// - `POST /api/snacks`
/// - `GET /api/snacks`
/// - `GET /api/snacks/date-range?startDate=..&endDate=..`
/// - `GET /api/snacks/:id`
/// - `PUT /api/snacks/:id`
/// - `DELETE /api/snacks/:id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    middleware::team::CurrentTeam,
    response::ApiResponse,
    routes::{
        load_users,
        validation::{deserialize_optional_datetime, non_negative_amount, not_blank, parse_datetime},
    },
};
use axum::extract::State;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use snackfund_shared::{
    auth::authorization::{require_active_member, require_food_manager},
    models::{
        membership::TeamMembership,
        snack::{Contribution, CreateSnack, Snack, UpdateSnack},
        user::PublicUser,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContributionInput {
    pub user_id: Uuid,

    #[validate(custom(
        function = "non_negative_amount",
        message = "Contribution amount must be non-negative"
    ))]
    pub amount: f64,
}

impl From<ContributionInput> for Contribution {
    fn from(input: ContributionInput) -> Self {
        Contribution {
            user_id: input.user_id,
            amount: input.amount,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnackRequest {
    #[validate(
        length(min = 1, message = "At least one contribution is required"),
        nested
    )]
    pub contributions: Vec<ContributionInput>,

    #[validate(
        custom(function = "not_blank", message = "Food item is required"),
        length(max = 255, message = "Food item must be at most 255 characters")
    )]
    pub food_item: String,

    #[validate(custom(function = "non_negative_amount", message = "Expense must be non-negative"))]
    pub expense: f64,

    pub note: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSnackRequest {
    #[validate(
        length(min = 1, message = "At least one contribution is required"),
        nested
    )]
    pub contributions: Option<Vec<ContributionInput>>,

    #[validate(
        custom(function = "not_blank", message = "Food item is required"),
        length(max = 255, message = "Food item must be at most 255 characters")
    )]
    pub food_item: Option<String>,

    #[validate(custom(function = "non_negative_amount", message = "Expense must be non-negative"))]
    pub expense: Option<f64>,

    pub note: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

/// Query for `GET /api/snacks/date-range`
///
/// Both bounds are kept as raw strings so a missing or malformed value
/// produces a field-level message instead of a generic query rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// Resolves the query into an inclusive `[start, end]` window
    ///
    /// A date-only `endDate` covers that whole day.
    pub fn resolve(&self) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
        let (Some(start), Some(end)) = (self.start_date.as_deref(), self.end_date.as_deref())
        else {
            return Err(ApiError::BadRequest(
                "Start date and end date are required".to_string(),
            ));
        };

        let (start, _) = parse_datetime(start)
            .ok_or_else(|| ApiError::invalid("startDate", "Invalid start date"))?;
        let (mut end, end_date_only) =
            parse_datetime(end).ok_or_else(|| ApiError::invalid("endDate", "Invalid end date"))?;

        if end_date_only {
            end = end + Duration::days(1) - Duration::milliseconds(1);
        }

        if start > end {
            return Err(ApiError::BadRequest(
                "Start date must be before end date".to_string(),
            ));
        }

        Ok((start, end))
    }
}

/// Snack with its contributors' public profiles
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnackView {
    #[serde(flatten)]
    pub snack: Snack,
    pub contributors: Vec<PublicUser>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Snack not found".to_string())
}

fn ensure_not_future(date: Option<DateTime<Utc>>) -> ApiResult<()> {
    match date {
        Some(date) if date > Utc::now() => {
            Err(ApiError::invalid("date", "Date cannot be in the future"))
        }
        _ => Ok(()),
    }
}

async fn ensure_contributors_in_team(
    state: &AppState,
    team_id: Uuid,
    contributions: &[ContributionInput],
) -> ApiResult<()> {
    for contribution in contributions {
        if !TeamMembership::is_active_member(&state.db, team_id, contribution.user_id).await? {
            return Err(ApiError::BadRequest(format!(
                "Contributor {} is not an active member of this team",
                contribution.user_id
            )));
        }
    }
    Ok(())
}

async fn enrich(state: &AppState, snacks: Vec<Snack>) -> ApiResult<Vec<SnackView>> {
    let user_ids: Vec<Uuid> = snacks
        .iter()
        .flat_map(|s| s.contributions.iter().map(|c| c.user_id))
        .collect();
    let users = load_users(&state.db, user_ids).await?;

    Ok(snacks
        .into_iter()
        .map(|snack| SnackView {
            contributors: snack
                .contributor_ids()
                .iter()
                .filter_map(|id| users.get(id).cloned())
                .collect(),
            snack,
        })
        .collect())
}

async fn enrich_one(state: &AppState, snack: Snack) -> ApiResult<SnackView> {
    enrich(state, vec![snack]).await?.pop().ok_or_else(not_found)
}

/// Record a snack event
///
/// # Errors
///
/// - `400`: Validation failed, the date is in the future, or a contributor
///   isn't an active member
/// - `403`: Caller isn't a food manager
pub async fn create_snack(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppJson(req): AppJson<CreateSnackRequest>,
) -> ApiResult<ApiResponse<SnackView>> {
    require_food_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;
    ensure_not_future(req.date)?;
    ensure_contributors_in_team(&state, scope.team_id, &req.contributions).await?;

    let snack = Snack::create(
        &state.db,
        CreateSnack {
            team_id: scope.team_id,
            contributions: req.contributions.into_iter().map(Into::into).collect(),
            food_item: req.food_item.trim().to_string(),
            expense: req.expense,
            note: req.note,
            date: req.date,
        },
    )
    .await?;

    tracing::debug!(
        snack_id = %snack.id,
        total = snack.total_contribution,
        "snack recorded"
    );

    Ok(ApiResponse::created(
        "Snack added successfully",
        enrich_one(&state, snack).await?,
    ))
}

pub async fn list_snacks(
    State(state): State<AppState>,
    scope: CurrentTeam,
) -> ApiResult<ApiResponse<Vec<SnackView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let snacks = Snack::list_by_team(&state.db, scope.team_id).await?;

    Ok(ApiResponse::ok(
        "Snacks retrieved successfully",
        enrich(&state, snacks).await?,
    ))
}

pub async fn list_snacks_by_date_range(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppQuery(query): AppQuery<DateRangeQuery>,
) -> ApiResult<ApiResponse<Vec<SnackView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;
    let (start, end) = query.resolve()?;

    let snacks = Snack::list_by_date_range(&state.db, scope.team_id, start, end).await?;

    Ok(ApiResponse::ok(
        "Snacks retrieved successfully",
        enrich(&state, snacks).await?,
    ))
}

pub async fn get_snack(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<SnackView>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let snack = Snack::find_in_team(&state.db, scope.team_id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Snack retrieved successfully",
        enrich_one(&state, snack).await?,
    ))
}

/// Edit a snack event; replacing contributions recomputes the total
pub async fn update_snack(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateSnackRequest>,
) -> ApiResult<ApiResponse<SnackView>> {
    require_food_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;
    ensure_not_future(req.date)?;

    if let Some(contributions) = &req.contributions {
        ensure_contributors_in_team(&state, scope.team_id, contributions).await?;
    }

    let snack = Snack::update(
        &state.db,
        scope.team_id,
        id,
        UpdateSnack {
            contributions: req
                .contributions
                .map(|list| list.into_iter().map(Into::into).collect()),
            food_item: req.food_item.map(|f| f.trim().to_string()),
            expense: req.expense,
            note: req.note,
            date: req.date,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Snack updated successfully",
        enrich_one(&state, snack).await?,
    ))
}

pub async fn delete_snack(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    require_food_manager(&state.db, scope.team_id, scope.user_id).await?;

    if !Snack::delete(&state.db, scope.team_id, id).await? {
        return Err(not_found());
    }

    Ok(ApiResponse::message("Snack deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn range(start: Option<&str>, end: Option<&str>) -> DateRangeQuery {
        DateRangeQuery {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn test_date_only_end_covers_whole_day() {
        let (start, end) = range(Some("2025-03-01"), Some("2025-03-31"))
            .resolve()
            .unwrap();

        assert_eq!(start.day(), 1);
        assert_eq!((end.day(), end.hour(), end.minute()), (31, 23, 59));
    }

    #[test]
    fn test_timestamp_end_is_kept_exact() {
        let (_, end) = range(Some("2025-03-01"), Some("2025-03-02T12:00:00Z"))
            .resolve()
            .unwrap();

        assert_eq!((end.day(), end.hour()), (2, 12));
    }

    #[test]
    fn test_missing_bound_rejected() {
        let err = range(Some("2025-03-01"), None).resolve().unwrap_err();
        assert_eq!(err.client_message(), "Start date and end date are required");
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = range(Some("2025-04-01"), Some("2025-03-01"))
            .resolve()
            .unwrap_err();
        assert_eq!(err.client_message(), "Start date must be before end date");
    }

    #[test]
    fn test_malformed_bound_rejected() {
        let err = range(Some("yesterday"), Some("2025-03-01"))
            .resolve()
            .unwrap_err();
        assert_eq!(err.client_message(), "Invalid start date");
    }

    #[test]
    fn test_create_requires_contributions() {
        let req: CreateSnackRequest = serde_json::from_str(
            r#"{"contributions": [], "foodItem": "Samosa", "expense": 10}"#,
        )
        .unwrap();

        let err: ApiError = req.validate().unwrap_err().into();
        assert_eq!(err.client_message(), "At least one contribution is required");
    }

    #[test]
    fn test_negative_contribution_rejected() {
        let body = format!(
            r#"{{"contributions": [{{"userId": "{}", "amount": -2}}], "foodItem": "Samosa", "expense": 10}}"#,
            Uuid::new_v4()
        );
        let req: CreateSnackRequest = serde_json::from_str(&body).unwrap();

        let err: ApiError = req.validate().unwrap_err().into();
        assert_eq!(err.client_message(), "Contribution amount must be non-negative");
    }

    #[test]
    fn test_future_date_rejected() {
        assert!(ensure_not_future(Some(Utc::now() + Duration::days(2))).is_err());
        assert!(ensure_not_future(Some(Utc::now() - Duration::days(2))).is_ok());
        assert!(ensure_not_future(None).is_ok());
    }
}
