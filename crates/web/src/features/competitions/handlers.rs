use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use storage::{
    Database,
    dto::{
        competition::{
            CompetitionFilter, CompetitionResponse, CreateCompetitionRequest, LeaderboardEntry,
            SubmitScoreRequest, UpdateCompetitionStatusRequest,
        },
        registration::{RegistrationFilter, RegistrationResponse},
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::AuthUser;

use super::services;

#[utoipa::path(
    get,
    path = "/api/competitions",
    params(CompetitionFilter),
    responses(
        (status = 200, description = "List competitions successfully", body = Vec<CompetitionResponse>)
    ),
    tag = "competitions"
)]
pub async fn list_competitions(
    State(db): State<Database>,
    Query(filter): Query<CompetitionFilter>,
) -> Result<Json<Vec<CompetitionResponse>>, WebError> {
    let competitions = services::list_competitions(db.pool(), &filter).await?;

    let response: Vec<CompetitionResponse> = competitions
        .into_iter()
        .map(CompetitionResponse::from)
        .collect();

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/competitions/{id}",
    params(
        ("id" = Uuid, Path, description = "Competition ID")
    ),
    responses(
        (status = 200, description = "Competition found", body = CompetitionResponse),
        (status = 404, description = "Competition not found")
    ),
    tag = "competitions"
)]
pub async fn get_competition(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let competition = services::get_competition(db.pool(), id).await?;

    Ok(Json(CompetitionResponse::from(competition)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/competitions/{id}/results",
    params(
        ("id" = Uuid, Path, description = "Competition ID")
    ),
    responses(
        (status = 200, description = "Settled leaderboard, best rank first", body = Vec<LeaderboardEntry>),
        (status = 404, description = "Competition not found")
    ),
    tag = "competitions"
)]
pub async fn get_results(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let results = services::get_results(db.pool(), id).await?;

    let response: Vec<LeaderboardEntry> = results.into_iter().map(LeaderboardEntry::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/competitions",
    request_body = CreateCompetitionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Competition created successfully", body = CompetitionResponse),
        (status = 400, description = "Validation error or unknown tier"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "competitions"
)]
pub async fn create_competition(
    State(db): State<Database>,
    Json(req): Json<CreateCompetitionRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    req.validate_start(Utc::now())
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let competition = services::create_competition(db.pool(), &req).await?;

    Ok((
        StatusCode::CREATED,
        Json(CompetitionResponse::from(competition)),
    )
        .into_response())
}

#[utoipa::path(
    patch,
    path = "/api/competitions/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Competition ID")
    ),
    request_body = UpdateCompetitionStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Status updated", body = CompetitionResponse),
        (status = 400, description = "Transition not allowed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Competition not found")
    ),
    tag = "competitions"
)]
pub async fn update_status(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCompetitionStatusRequest>,
) -> Result<Response, WebError> {
    let competition = services::update_status(db.pool(), id, req.status).await?;

    Ok(Json(CompetitionResponse::from(competition)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/competitions/{id}/settle",
    params(
        ("id" = Uuid, Path, description = "Competition ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Competition settled, prizes paid", body = Vec<LeaderboardEntry>),
        (status = 400, description = "Competition is not finished"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Competition not found"),
        (status = 409, description = "Competition already settled")
    ),
    tag = "competitions"
)]
pub async fn settle_competition(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let results = services::settle(db.pool(), id).await?;

    let response: Vec<LeaderboardEntry> = results.into_iter().map(LeaderboardEntry::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/competitions/{id}/registrations",
    params(
        ("id" = Uuid, Path, description = "Competition ID"),
        RegistrationFilter
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Registrations for the competition", body = Vec<RegistrationResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Competition not found")
    ),
    tag = "competitions"
)]
pub async fn list_registrations(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Query(filter): Query<RegistrationFilter>,
) -> Result<Response, WebError> {
    let registrations = services::list_registrations(db.pool(), id, filter.status).await?;

    let response: Vec<RegistrationResponse> = registrations
        .into_iter()
        .map(RegistrationResponse::from)
        .collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/competitions/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Competition ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Entry cancelled and credits refunded", body = RegistrationResponse),
        (status = 400, description = "Not registered, or paid by card"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Registration window closed")
    ),
    tag = "registrations"
)]
pub async fn cancel_registration(
    State(db): State<Database>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let registration = services::cancel_entry(db.pool(), &user, id).await?;

    Ok(Json(RegistrationResponse::from(registration)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/competitions/{id}/scores",
    params(
        ("id" = Uuid, Path, description = "Competition ID")
    ),
    request_body = SubmitScoreRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Score recorded", body = RegistrationResponse),
        (status = 400, description = "Invalid score or competition not live"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Score already submitted")
    ),
    tag = "registrations"
)]
pub async fn submit_score(
    State(db): State<Database>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitScoreRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let registration = services::submit_score(
        db.pool(),
        &user,
        id,
        req.correct_answers,
        req.total_questions,
        req.time_taken_ms,
    )
    .await?;

    Ok(Json(RegistrationResponse::from(registration)).into_response())
}
