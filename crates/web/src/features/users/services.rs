use rust_decimal::Decimal;
use sqlx::PgPool;
use storage::{
    dto::{credits::BalanceResponse, user::ProfileResponse},
    error::Result,
    repository::credit::CreditRepository,
    services::users,
};

use crate::middleware::auth::AuthUser;

/// Profile of the caller, mirroring the auth user into the database on first sight
pub async fn get_profile(pool: &PgPool, user: &AuthUser) -> Result<ProfileResponse> {
    let profile = users::ensure_user(pool, user.user_id, user.email.as_deref()).await?;
    let balance = CreditRepository::new(pool).get_balance(user.user_id).await?;

    Ok(ProfileResponse::new(profile, BalanceResponse::from(balance)))
}

pub async fn claim_referral(
    pool: &PgPool,
    user: &AuthUser,
    code: &str,
    bonus: Decimal,
) -> Result<ProfileResponse> {
    users::ensure_user(pool, user.user_id, user.email.as_deref()).await?;
    let profile = users::claim_referral(pool, user.user_id, code, bonus).await?;
    let balance = CreditRepository::new(pool).get_balance(user.user_id).await?;

    Ok(ProfileResponse::new(profile, BalanceResponse::from(balance)))
}
