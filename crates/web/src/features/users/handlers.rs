use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::user::{ClaimReferralRequest, ProfileResponse},
};
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/me",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller profile with credit balance", body = ProfileResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users"
)]
pub async fn get_me(State(db): State<Database>, user: AuthUser) -> Result<Response, WebError> {
    let profile = services::get_profile(db.pool(), &user).await?;

    Ok(Json(profile).into_response())
}

#[utoipa::path(
    post,
    path = "/api/referrals/claim",
    request_body = ClaimReferralRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Referral recorded and referrer credited", body = ProfileResponse),
        (status = 400, description = "Unknown code, own code, or already referred"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users"
)]
pub async fn claim_referral(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ClaimReferralRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let profile = services::claim_referral(
        state.db.pool(),
        &user,
        &req.code,
        state.config.referral_bonus,
    )
    .await?;

    Ok(Json(profile).into_response())
}
