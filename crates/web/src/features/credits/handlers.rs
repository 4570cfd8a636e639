use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        common::{PaginatedResponse, PaginationParams},
        credits::{BalanceResponse, GrantCreditsRequest, PurchaseCreditsRequest, TransactionResponse},
        payment::CheckoutResponse,
    },
    services::{credits::purchase_price_cents, users},
};
use validator::Validate;

use crate::error::WebError;
use crate::features::payments::services::start_checkout;
use crate::middleware::auth::AuthUser;
use crate::payments::CheckoutPurpose;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/credits",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current balance per pool", body = BalanceResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "credits"
)]
pub async fn get_balance(
    State(db): State<Database>,
    user: AuthUser,
) -> Result<Json<BalanceResponse>, WebError> {
    let balance = services::get_balance(db.pool(), user.user_id).await?;

    Ok(Json(BalanceResponse::from(balance)))
}

#[utoipa::path(
    post,
    path = "/api/credits",
    request_body = PurchaseCreditsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Checkout created; credits are added once payment is confirmed", body = CheckoutResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Payment provider unavailable")
    ),
    tag = "credits"
)]
pub async fn purchase_credits(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<PurchaseCreditsRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    users::ensure_user(state.db.pool(), user.user_id, user.email.as_deref()).await?;

    let amount_cents = purchase_price_cents(req.credits, state.config.credit_unit_price_cents)?;
    let purpose = CheckoutPurpose::Credits {
        user_id: user.user_id,
        credits: req.credits,
    };

    let checkout = start_checkout(
        &state,
        req.provider,
        &purpose,
        &format!("{} Pitchside credits", req.credits),
        amount_cents,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(checkout)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/credits/transactions",
    params(PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Credit movements, newest first", body = PaginatedResponse<TransactionResponse>),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "credits"
)]
pub async fn list_transactions(
    State(db): State<Database>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Response, WebError> {
    params.validate().map_err(WebError::BadRequest)?;

    let (transactions, total_items) =
        services::list_transactions(db.pool(), user.user_id, &params).await?;

    let data: Vec<TransactionResponse> = transactions
        .into_iter()
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(PaginatedResponse::new(data, &params, total_items)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/admin/credits/grant",
    request_body = GrantCreditsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Credits granted", body = BalanceResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "admin"
)]
pub async fn grant_credits(
    State(db): State<Database>,
    Json(req): Json<GrantCreditsRequest>,
) -> Result<Response, WebError> {
    req.validate()?;
    req.validate_amount()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let balance = services::grant(db.pool(), &req).await?;

    Ok(Json(BalanceResponse::from(balance)).into_response())
}
