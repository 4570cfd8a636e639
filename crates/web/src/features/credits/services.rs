use sqlx::PgPool;
use storage::{
    dto::{common::PaginationParams, credits::GrantCreditsRequest},
    error::Result,
    models::{CreditBalance, CreditTransaction},
    repository::credit::CreditRepository,
    services::credits,
};
use uuid::Uuid;

pub async fn get_balance(pool: &PgPool, user_id: Uuid) -> Result<CreditBalance> {
    let repo = CreditRepository::new(pool);
    repo.get_balance(user_id).await
}

/// Audit log page, newest first
pub async fn list_transactions(
    pool: &PgPool,
    user_id: Uuid,
    params: &PaginationParams,
) -> Result<(Vec<CreditTransaction>, i64)> {
    let repo = CreditRepository::new(pool);
    repo.list_transactions(user_id, params.offset(), params.limit())
        .await
}

pub async fn grant(pool: &PgPool, req: &GrantCreditsRequest) -> Result<CreditBalance> {
    credits::grant_credits(
        pool,
        req.user_id,
        req.credit_type,
        req.amount,
        req.reason.clone(),
    )
    .await
}
