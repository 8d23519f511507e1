/// Expense endpoints
///
/// Expenses record money a member spent on the team's behalf. All routes
/// operate on the caller's current team. Reads need an active membership;
/// writes need the fund manager role.
///
/// - `POST /api/expenses`
/// - `GET /api/expenses`
/// - `GET /api/expenses/:id`
/// - `PUT /api/expenses/:id`
/// - `DELETE /api/expenses/:id`
/// - `GET /api/expenses/user/:user_id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    middleware::team::CurrentTeam,
    response::ApiResponse,
    routes::{
        load_users,
        validation::{deserialize_optional_datetime, non_negative_amount, not_blank},
    },
};
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snackfund_shared::{
    auth::authorization::{require_active_member, require_fund_manager},
    models::{
        expense::{CreateExpense, Expense, UpdateExpense},
        membership::TeamMembership,
        user::PublicUser,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    /// Owner of the expense; defaults to the caller
    pub user_id: Option<Uuid>,

    #[validate(custom(function = "non_negative_amount", message = "Amount must be non-negative"))]
    pub amount: f64,

    #[validate(custom(function = "not_blank", message = "Reason is required"))]
    pub reason: String,

    pub note: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    #[validate(custom(function = "non_negative_amount", message = "Amount must be non-negative"))]
    pub amount: Option<f64>,

    #[validate(custom(function = "not_blank", message = "Reason is required"))]
    pub reason: Option<String>,

    pub note: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

/// Expense with its owner's public profile
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    #[serde(flatten)]
    pub expense: Expense,
    pub user: Option<PublicUser>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Expense not found".to_string())
}

async fn enrich(state: &AppState, expenses: Vec<Expense>) -> ApiResult<Vec<ExpenseView>> {
    let users = load_users(&state.db, expenses.iter().map(|e| e.user_id)).await?;

    Ok(expenses
        .into_iter()
        .map(|expense| ExpenseView {
            user: users.get(&expense.user_id).cloned(),
            expense,
        })
        .collect())
}

async fn enrich_one(state: &AppState, expense: Expense) -> ApiResult<ExpenseView> {
    enrich(state, vec![expense])
        .await?
        .pop()
        .ok_or_else(not_found)
}

/// Record an expense
///
/// # Errors
///
/// - `400`: Validation failed, or the owner isn't an active team member
/// - `403`: Caller isn't a fund manager
pub async fn create_expense(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppJson(req): AppJson<CreateExpenseRequest>,
) -> ApiResult<ApiResponse<ExpenseView>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    let owner = req.user_id.unwrap_or(scope.user_id);
    if !TeamMembership::is_active_member(&state.db, scope.team_id, owner).await? {
        return Err(ApiError::BadRequest(
            "User is not an active member of this team".to_string(),
        ));
    }

    let expense = Expense::create(
        &state.db,
        CreateExpense {
            team_id: scope.team_id,
            user_id: owner,
            amount: req.amount,
            reason: req.reason.trim().to_string(),
            note: req.note,
            date: req.date,
        },
    )
    .await?;

    tracing::debug!(expense_id = %expense.id, team_id = %scope.team_id, "expense recorded");

    Ok(ApiResponse::created(
        "Expense added successfully",
        enrich_one(&state, expense).await?,
    ))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    scope: CurrentTeam,
) -> ApiResult<ApiResponse<Vec<ExpenseView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let expenses = Expense::list_by_team(&state.db, scope.team_id).await?;

    Ok(ApiResponse::ok(
        "Expenses retrieved successfully",
        enrich(&state, expenses).await?,
    ))
}

pub async fn get_expense(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<ExpenseView>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let expense = Expense::find_in_team(&state.db, scope.team_id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Expense retrieved successfully",
        enrich_one(&state, expense).await?,
    ))
}

pub async fn update_expense(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateExpenseRequest>,
) -> ApiResult<ApiResponse<ExpenseView>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    let expense = Expense::update(
        &state.db,
        scope.team_id,
        id,
        UpdateExpense {
            amount: req.amount,
            reason: req.reason.map(|r| r.trim().to_string()),
            note: req.note,
            date: req.date,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Expense updated successfully",
        enrich_one(&state, expense).await?,
    ))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;

    if !Expense::delete(&state.db, scope.team_id, id).await? {
        return Err(not_found());
    }

    tracing::debug!(expense_id = %id, team_id = %scope.team_id, "expense deleted");

    Ok(ApiResponse::message("Expense deleted successfully"))
}

/// Expenses owned by one member of the current team
pub async fn list_user_expenses(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(user_id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<ExpenseView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let expenses = Expense::list_by_user(&state.db, scope.team_id, user_id).await?;

    Ok(ApiResponse::ok(
        "Expenses retrieved successfully",
        enrich(&state, expenses).await?,
    ))
}
