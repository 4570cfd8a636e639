//! Users mirrored from the hosted auth service, and referral claims.

use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::ledger::LedgerError;
use crate::error::{Result, StorageError};
use crate::models::{CreditType, TransactionType, User};
use crate::repository::credit::{CreditRepository, NewTransaction};
use crate::repository::user::UserRepository;

const REFERRAL_CODE_LEN: usize = 8;
const REFERRAL_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_CODE_ATTEMPTS: usize = 5;

pub fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| REFERRAL_CODE_ALPHABET[rng.gen_range(0..REFERRAL_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Fetch the user, creating the row the first time an authenticated id shows up
pub async fn ensure_user(pool: &PgPool, user_id: Uuid, email: Option<&str>) -> Result<User> {
    let repo = UserRepository::new(pool);

    for _ in 0..MAX_CODE_ATTEMPTS {
        match repo.upsert(user_id, email, &generate_referral_code()).await {
            Ok(user) => return Ok(user),
            // referral code collision, draw again
            Err(e) if e.is_unique_violation() => continue,
            Err(e) => return Err(e),
        }
    }

    Err(StorageError::ConstraintViolation(
        "Could not allocate a unique referral code".to_string(),
    ))
}

/// Attach `user_id` to the owner of `code` and pay the referrer's bonus
pub async fn claim_referral(
    pool: &PgPool,
    user_id: Uuid,
    code: &str,
    bonus: Decimal,
) -> Result<User> {
    let mut tx = pool.begin().await?;

    let user = UserRepository::lock(&mut tx, user_id).await?;
    if user.referred_by.is_some() {
        return Err(LedgerError::ReferralRejected("referral already claimed".to_string()).into());
    }

    let referrer = UserRepository::find_by_referral_code(&mut tx, code)
        .await
        .map_err(|e| match e {
            StorageError::NotFound => {
                StorageError::Ledger(LedgerError::ReferralRejected("unknown code".to_string()))
            }
            other => other,
        })?;

    if referrer.user_id == user_id {
        return Err(LedgerError::ReferralRejected("cannot refer yourself".to_string()).into());
    }

    UserRepository::set_referred_by(&mut tx, user_id, referrer.user_id).await?;

    if bonus > Decimal::ZERO {
        CreditRepository::credit_pool(&mut tx, referrer.user_id, CreditType::Referral, bonus)
            .await?;
        CreditRepository::record(
            &mut tx,
            &NewTransaction {
                user_id: referrer.user_id,
                amount: bonus,
                credit_type: CreditType::Referral,
                transaction_type: TransactionType::ReferralBonus,
                reference_id: Some(user_id),
                description: Some("Referral bonus".to_string()),
            },
        )
        .await?;
    }

    tx.commit().await?;

    tracing::info!(%user_id, referrer = %referrer.user_id, %bonus, "Referral claimed");

    Ok(User {
        referred_by: Some(referrer.user_id),
        ..user
    })
}
