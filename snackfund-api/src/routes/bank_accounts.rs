/// Bank account endpoints
///
/// Each member may register one bank account per team, which the fund
/// manager uses when settling up. The `(team, user)` uniqueness is enforced
/// by the database; a duplicate insert surfaces as a conflict.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    middleware::team::CurrentTeam,
    response::ApiResponse,
    routes::{load_users, validation::not_blank},
};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use snackfund_shared::{
    auth::authorization::{require_active_member, require_fund_manager},
    models::{
        bank_account::{BankAccount, CreateBankAccount, UpdateBankAccount},
        membership::TeamMembership,
        user::PublicUser,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBankAccountRequest {
    /// Account holder; defaults to the caller
    pub user_id: Option<Uuid>,

    #[validate(
        custom(function = "not_blank", message = "Bank name is required"),
        length(max = 255, message = "Bank name must be at most 255 characters")
    )]
    pub bank_name: String,

    #[validate(
        custom(function = "not_blank", message = "Branch is required"),
        length(max = 255, message = "Branch must be at most 255 characters")
    )]
    pub branch: String,

    #[validate(
        custom(function = "not_blank", message = "Account number is required"),
        length(max = 64, message = "Account number must be at most 64 characters")
    )]
    pub account_no: String,

    #[validate(
        custom(function = "not_blank", message = "Account title is required"),
        length(max = 255, message = "Account title must be at most 255 characters")
    )]
    pub account_title: String,

    #[validate(
        custom(function = "not_blank", message = "Routing number is required"),
        length(max = 64, message = "Routing number must be at most 64 characters")
    )]
    pub routing_number: String,
}

/// The account number and holder are fixed once registered
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBankAccountRequest {
    #[validate(
        custom(function = "not_blank", message = "Bank name is required"),
        length(max = 255, message = "Bank name must be at most 255 characters")
    )]
    pub bank_name: Option<String>,

    #[validate(
        custom(function = "not_blank", message = "Branch is required"),
        length(max = 255, message = "Branch must be at most 255 characters")
    )]
    pub branch: Option<String>,

    #[validate(
        custom(function = "not_blank", message = "Account title is required"),
        length(max = 255, message = "Account title must be at most 255 characters")
    )]
    pub account_title: Option<String>,

    #[validate(
        custom(function = "not_blank", message = "Routing number is required"),
        length(max = 64, message = "Routing number must be at most 64 characters")
    )]
    pub routing_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountView {
    #[serde(flatten)]
    pub account: BankAccount,
    pub user: Option<PublicUser>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Bank account not found".to_string())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

async fn enrich(state: &AppState, accounts: Vec<BankAccount>) -> ApiResult<Vec<BankAccountView>> {
    let users = load_users(&state.db, accounts.iter().map(|a| a.user_id)).await?;

    Ok(accounts
        .into_iter()
        .map(|account| BankAccountView {
            user: users.get(&account.user_id).cloned(),
            account,
        })
        .collect())
}

async fn enrich_one(state: &AppState, account: BankAccount) -> ApiResult<BankAccountView> {
    enrich(state, vec![account]).await?.pop().ok_or_else(not_found)
}

/// Register a bank account for a team member
///
/// # Errors
///
/// - `400`: Validation failed, the holder isn't on the team, or they
///   already have an account registered here
/// - `403`: Caller isn't a fund manager
pub async fn create_bank_account(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppJson(req): AppJson<CreateBankAccountRequest>,
) -> ApiResult<ApiResponse<BankAccountView>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    let holder = req.user_id.unwrap_or(scope.user_id);
    if TeamMembership::find(&state.db, scope.team_id, holder).await?.is_none() {
        return Err(ApiError::BadRequest(
            "User is not a member of this team".to_string(),
        ));
    }

    let account = BankAccount::create(
        &state.db,
        CreateBankAccount {
            team_id: scope.team_id,
            user_id: holder,
            bank_name: req.bank_name.trim().to_string(),
            branch: req.branch.trim().to_string(),
            account_no: req.account_no.trim().to_string(),
            account_title: req.account_title.trim().to_string(),
            routing_number: req.routing_number.trim().to_string(),
        },
    )
    .await?;

    tracing::info!(
        bank_account_id = %account.id,
        holder = %holder,
        actor = %scope.user_id,
        "bank account registered"
    );

    Ok(ApiResponse::created(
        "Bank account added successfully",
        enrich_one(&state, account).await?,
    ))
}

pub async fn list_bank_accounts(
    State(state): State<AppState>,
    scope: CurrentTeam,
) -> ApiResult<ApiResponse<Vec<BankAccountView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let accounts = BankAccount::list_by_team(&state.db, scope.team_id).await?;

    Ok(ApiResponse::ok(
        "Bank accounts retrieved successfully",
        enrich(&state, accounts).await?,
    ))
}

pub async fn get_bank_account(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<BankAccountView>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let account = BankAccount::find_in_team(&state.db, scope.team_id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Bank account retrieved successfully",
        enrich_one(&state, account).await?,
    ))
}

pub async fn update_bank_account(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateBankAccountRequest>,
) -> ApiResult<ApiResponse<BankAccountView>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    let account = BankAccount::update(
        &state.db,
        scope.team_id,
        id,
        UpdateBankAccount {
            bank_name: trimmed(req.bank_name),
            branch: trimmed(req.branch),
            account_title: trimmed(req.account_title),
            routing_number: trimmed(req.routing_number),
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Bank account updated successfully",
        enrich_one(&state, account).await?,
    ))
}

pub async fn delete_bank_account(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;

    if !BankAccount::delete(&state.db, scope.team_id, id).await? {
        return Err(not_found());
    }

    tracing::info!(bank_account_id = %id, actor = %scope.user_id, "bank account deleted");

    Ok(ApiResponse::message("Bank account deleted successfully"))
}
