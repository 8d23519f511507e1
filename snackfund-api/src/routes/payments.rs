/// Payment endpoints
///
/// Payments are contributions into the team fund. Amounts must be strictly
/// positive. Reads need an active membership; writes need the fund manager
/// role.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    middleware::team::CurrentTeam,
    response::ApiResponse,
    routes::{
        load_users,
        validation::{deserialize_optional_datetime, positive_amount},
    },
};
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snackfund_shared::{
    auth::authorization::{require_active_member, require_fund_manager},
    models::{
        membership::TeamMembership,
        payment::{CreatePayment, Payment, UpdatePayment},
        user::PublicUser,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Paying member; defaults to the caller
    pub payed_by: Option<Uuid>,

    #[validate(custom(function = "positive_amount", message = "Amount must be greater than 0"))]
    pub amount: f64,

    pub note: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub payed_by: Option<Uuid>,

    #[validate(custom(function = "positive_amount", message = "Amount must be greater than 0"))]
    pub amount: Option<f64>,

    pub note: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

/// Payment with the payer's public profile
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    #[serde(flatten)]
    pub payment: Payment,
    pub payed_by_user: Option<PublicUser>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Payment not found".to_string())
}

async fn enrich(state: &AppState, payments: Vec<Payment>) -> ApiResult<Vec<PaymentView>> {
    let users = load_users(&state.db, payments.iter().map(|p| p.payed_by)).await?;

    Ok(payments
        .into_iter()
        .map(|payment| PaymentView {
            payed_by_user: users.get(&payment.payed_by).cloned(),
            payment,
        })
        .collect())
}

async fn enrich_one(state: &AppState, payment: Payment) -> ApiResult<PaymentView> {
    enrich(state, vec![payment]).await?.pop().ok_or_else(not_found)
}

async fn ensure_payer_in_team(state: &AppState, team_id: Uuid, payer: Uuid) -> ApiResult<()> {
    if !TeamMembership::is_active_member(&state.db, team_id, payer).await? {
        return Err(ApiError::BadRequest(
            "User is not an active member of this team".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_payment(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppJson(req): AppJson<CreatePaymentRequest>,
) -> ApiResult<ApiResponse<PaymentView>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    let payer = req.payed_by.unwrap_or(scope.user_id);
    ensure_payer_in_team(&state, scope.team_id, payer).await?;

    let payment = Payment::create(
        &state.db,
        CreatePayment {
            team_id: scope.team_id,
            payed_by: payer,
            amount: req.amount,
            note: req.note,
            date: req.date,
        },
    )
    .await?;

    tracing::debug!(payment_id = %payment.id, team_id = %scope.team_id, "payment recorded");

    Ok(ApiResponse::created(
        "Payment added successfully",
        enrich_one(&state, payment).await?,
    ))
}

pub async fn list_payments(
    State(state): State<AppState>,
    scope: CurrentTeam,
) -> ApiResult<ApiResponse<Vec<PaymentView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let payments = Payment::list_by_team(&state.db, scope.team_id).await?;

    Ok(ApiResponse::ok(
        "Payments retrieved successfully",
        enrich(&state, payments).await?,
    ))
}

pub async fn get_payment(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<PaymentView>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let payment = Payment::find_in_team(&state.db, scope.team_id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Payment retrieved successfully",
        enrich_one(&state, payment).await?,
    ))
}

pub async fn update_payment(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdatePaymentRequest>,
) -> ApiResult<ApiResponse<PaymentView>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;
    req.validate()?;

    if let Some(payer) = req.payed_by {
        ensure_payer_in_team(&state, scope.team_id, payer).await?;
    }

    let payment = Payment::update(
        &state.db,
        scope.team_id,
        id,
        UpdatePayment {
            payed_by: req.payed_by,
            amount: req.amount,
            note: req.note,
            date: req.date,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Payment updated successfully",
        enrich_one(&state, payment).await?,
    ))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    require_fund_manager(&state.db, scope.team_id, scope.user_id).await?;

    if !Payment::delete(&state.db, scope.team_id, id).await? {
        return Err(not_found());
    }

    Ok(ApiResponse::message("Payment deleted successfully"))
}

/// Payments made by one member of the current team
pub async fn list_user_payments(
    State(state): State<AppState>,
    scope: CurrentTeam,
    AppPath(user_id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<PaymentView>>> {
    require_active_member(&state.db, scope.team_id, scope.user_id).await?;

    let payments = Payment::list_by_user(&state.db, scope.team_id, user_id).await?;

    Ok(ApiResponse::ok(
        "Payments retrieved successfully",
        enrich(&state, payments).await?,
    ))
}
