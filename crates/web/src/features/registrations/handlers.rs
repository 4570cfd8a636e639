use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::registration::{RegisterCompetitionRequest, RegisterCompetitionResponse};

use crate::error::WebError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/register-competition",
    request_body = RegisterCompetitionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Registration created", body = RegisterCompetitionResponse),
        (status = 200, description = "Existing registration returned unchanged, or updated in place (see `updated`)", body = RegisterCompetitionResponse),
        (status = 400, description = "Unknown competition tier"),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "Insufficient credits"),
        (status = 403, description = "Registration closed"),
        (status = 404, description = "Competition not found"),
        (status = 409, description = "Already registered with another payment")
    ),
    tag = "registrations"
)]
pub async fn register_competition(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<RegisterCompetitionRequest>,
) -> Result<Response, WebError> {
    let response = services::register(&state, &user, &req).await?;

    let status = if response.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(response)).into_response())
}
