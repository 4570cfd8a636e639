//! Adding credits to the ledger: purchases confirmed by a payment provider
//! and operator grants.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::ledger::LedgerError;
use crate::error::Result;
use crate::models::{CreditBalance, CreditType, PaymentProvider, TransactionType};
use crate::repository::credit::{CreditRepository, NewTransaction};
use crate::repository::payment::PaymentEventRepository;

pub const MIN_PURCHASE_CREDITS: i64 = 1;
pub const MAX_PURCHASE_CREDITS: i64 = 1000;

/// Price of a credit pack in the smallest currency unit
pub fn purchase_price_cents(
    credits: i64,
    unit_price_cents: i64,
) -> std::result::Result<i64, LedgerError> {
    if !(MIN_PURCHASE_CREDITS..=MAX_PURCHASE_CREDITS).contains(&credits) {
        return Err(LedgerError::InvalidAmount(Decimal::from(credits)));
    }
    Ok(credits * unit_price_cents)
}

/// Outcome of applying a provider confirmation
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    Credited(CreditBalance),
    /// The provider event was already applied earlier
    Duplicate,
}

/// Add purchased credits for a confirmed payment inside the caller's
/// transaction, at most once per provider event id.
pub async fn apply_purchase(
    tx: &mut Transaction<'_, Postgres>,
    provider: PaymentProvider,
    event_id: &str,
    event_type: &str,
    user_id: Uuid,
    credits: Decimal,
) -> Result<PurchaseOutcome> {
    if credits <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(credits).into());
    }

    if !PaymentEventRepository::claim(tx, provider, event_id, event_type).await? {
        tracing::info!(?provider, event_id, "Payment event already processed, skipping");
        return Ok(PurchaseOutcome::Duplicate);
    }

    let balance = CreditRepository::credit_pool(tx, user_id, CreditType::Purchased, credits).await?;
    CreditRepository::record(
        tx,
        &NewTransaction {
            user_id,
            amount: credits,
            credit_type: CreditType::Purchased,
            transaction_type: TransactionType::Purchase,
            reference_id: None,
            description: Some(format!("{:?} payment {}", provider, event_id)),
        },
    )
    .await?;

    tracing::info!(%user_id, %credits, ?provider, event_id, "Purchased credits added");

    Ok(PurchaseOutcome::Credited(balance))
}

/// Operator grant into any pool
pub async fn grant_credits(
    pool: &PgPool,
    user_id: Uuid,
    credit_type: CreditType,
    amount: Decimal,
    reason: Option<String>,
) -> Result<CreditBalance> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount).into());
    }

    let mut tx = pool.begin().await?;

    let balance = CreditRepository::credit_pool(&mut tx, user_id, credit_type, amount).await?;
    CreditRepository::record(
        &mut tx,
        &NewTransaction {
            user_id,
            amount,
            credit_type,
            transaction_type: TransactionType::AdminGrant,
            reference_id: None,
            description: reason,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(%user_id, %amount, ?credit_type, "Credits granted");

    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_price() {
        assert_eq!(purchase_price_cents(5, 100), Ok(500));
        assert_eq!(purchase_price_cents(1000, 99), Ok(99_000));
    }

    #[test]
    fn test_purchase_bounds() {
        assert!(purchase_price_cents(0, 100).is_err());
        assert!(purchase_price_cents(1001, 100).is_err());
        assert!(purchase_price_cents(-3, 100).is_err());
    }
}
