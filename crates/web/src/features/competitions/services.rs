use sqlx::PgPool;
use storage::{
    dto::competition::{CompetitionFilter, CreateCompetitionRequest},
    error::Result,
    models::{
        Competition, CompetitionRegistration, CompetitionResult, CompetitionStatus,
        RegistrationStatus,
    },
    repository::{
        competition::CompetitionRepository, registration::RegistrationRepository,
        result::ResultRepository,
    },
    services::{competitions, registration, settlement},
};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

/// List competitions, optionally by status
pub async fn list_competitions(pool: &PgPool, filter: &CompetitionFilter) -> Result<Vec<Competition>> {
    let repo = CompetitionRepository::new(pool);
    repo.list(filter.status).await
}

pub async fn get_competition(pool: &PgPool, competition_id: Uuid) -> Result<Competition> {
    let repo = CompetitionRepository::new(pool);
    repo.find_by_id(competition_id).await
}

/// Create a competition priced from its tier
pub async fn create_competition(pool: &PgPool, req: &CreateCompetitionRequest) -> Result<Competition> {
    competitions::create_competition(pool, &req.name, req.start_time).await
}

pub async fn update_status(
    pool: &PgPool,
    competition_id: Uuid,
    status: CompetitionStatus,
) -> Result<Competition> {
    competitions::update_status(pool, competition_id, status).await
}

/// Final leaderboard; empty until the competition is settled
pub async fn get_results(pool: &PgPool, competition_id: Uuid) -> Result<Vec<CompetitionResult>> {
    CompetitionRepository::new(pool)
        .find_by_id(competition_id)
        .await?;

    let repo = ResultRepository::new(pool);
    repo.list_for_competition(competition_id).await
}

pub async fn settle(pool: &PgPool, competition_id: Uuid) -> Result<Vec<CompetitionResult>> {
    settlement::settle_competition(pool, competition_id).await
}

pub async fn list_registrations(
    pool: &PgPool,
    competition_id: Uuid,
    status: Option<RegistrationStatus>,
) -> Result<Vec<CompetitionRegistration>> {
    CompetitionRepository::new(pool)
        .find_by_id(competition_id)
        .await?;

    let repo = RegistrationRepository::new(pool);
    repo.list_for_competition(competition_id, status).await
}

pub async fn cancel_entry(
    pool: &PgPool,
    user: &AuthUser,
    competition_id: Uuid,
) -> Result<CompetitionRegistration> {
    registration::cancel_registration(pool, user.user_id, competition_id).await
}

pub async fn submit_score(
    pool: &PgPool,
    user: &AuthUser,
    competition_id: Uuid,
    correct_answers: i32,
    total_questions: i32,
    time_taken_ms: i64,
) -> Result<CompetitionRegistration> {
    settlement::submit_score(
        pool,
        user.user_id,
        competition_id,
        correct_answers,
        total_questions,
        time_taken_ms,
    )
    .await
}
