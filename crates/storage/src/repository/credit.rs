use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{CreditBalance, CreditTransaction, CreditType, TransactionType};
use crate::services::ledger::Deduction;

/// Audit row to be written alongside a balance change
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub credit_type: CreditType,
    pub transaction_type: TransactionType,
    pub reference_id: Option<Uuid>,
    pub description: Option<String>,
}

/// Repository for credit balances and the transaction log
pub struct CreditRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CreditRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current balance; a user without a row has empty pools
    pub async fn get_balance(&self, user_id: Uuid) -> Result<CreditBalance> {
        let balance = sqlx::query_as::<_, CreditBalance>(
            r#"
            SELECT user_id, purchased_credits, winnings_credits, referral_credits, updated_at
            FROM credit_balances
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(balance.unwrap_or_else(|| CreditBalance::empty(user_id)))
    }

    /// Page through a user's transactions, newest first
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<CreditTransaction>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM credit_transactions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        let transactions = sqlx::query_as::<_, CreditTransaction>(
            r#"
            SELECT transaction_id, user_id, amount, credit_type, transaction_type,
                   reference_id, description, created_at
            FROM credit_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, transaction_id
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok((transactions, total))
    }

    /// Make sure a balance row exists so it can be locked
    pub async fn ensure_balance(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO credit_balances (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.code().as_deref() == Some("23503")
            {
                return StorageError::NotFound;
            }
            StorageError::from(e)
        })?;

        Ok(())
    }

    /// Lock the balance row until the transaction ends
    pub async fn lock_balance(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<CreditBalance> {
        let balance = sqlx::query_as::<_, CreditBalance>(
            r#"
            SELECT user_id, purchased_credits, winnings_credits, referral_credits, updated_at
            FROM credit_balances
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(balance)
    }

    /// Subtract a deduction; the CHECK constraints reject any pool going negative
    pub async fn apply_deduction(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        deduction: &Deduction,
    ) -> Result<CreditBalance> {
        Self::shift(
            tx,
            user_id,
            -deduction.referral,
            -deduction.winnings,
            -deduction.purchased,
        )
        .await
    }

    /// Give a deduction back to the pools it came from
    pub async fn apply_refund(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        deduction: &Deduction,
    ) -> Result<CreditBalance> {
        Self::shift(
            tx,
            user_id,
            deduction.referral,
            deduction.winnings,
            deduction.purchased,
        )
        .await
    }

    /// Add credits to a single pool
    pub async fn credit_pool(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        pool: CreditType,
        amount: Decimal,
    ) -> Result<CreditBalance> {
        let (referral, winnings, purchased) = match pool {
            CreditType::Referral => (amount, Decimal::ZERO, Decimal::ZERO),
            CreditType::Winnings => (Decimal::ZERO, amount, Decimal::ZERO),
            CreditType::Purchased => (Decimal::ZERO, Decimal::ZERO, amount),
        };
        Self::ensure_balance(tx, user_id).await?;
        Self::shift(tx, user_id, referral, winnings, purchased).await
    }

    async fn shift(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        referral: Decimal,
        winnings: Decimal,
        purchased: Decimal,
    ) -> Result<CreditBalance> {
        let balance = sqlx::query_as::<_, CreditBalance>(
            r#"
            UPDATE credit_balances
            SET referral_credits = referral_credits + $2,
                winnings_credits = winnings_credits + $3,
                purchased_credits = purchased_credits + $4,
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, purchased_credits, winnings_credits, referral_credits, updated_at
            "#,
        )
        .bind(user_id)
        .bind(referral)
        .bind(winnings)
        .bind(purchased)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_check_violation() {
                return StorageError::ConstraintViolation(
                    "Credit balance cannot go negative".to_string(),
                );
            }
            err
        })?
        .ok_or(StorageError::NotFound)?;

        Ok(balance)
    }

    /// Append to the transaction log
    pub async fn record(
        tx: &mut Transaction<'_, Postgres>,
        entry: &NewTransaction,
    ) -> Result<CreditTransaction> {
        let transaction = sqlx::query_as::<_, CreditTransaction>(
            r#"
            INSERT INTO credit_transactions (
                user_id, amount, credit_type, transaction_type, reference_id, description
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING transaction_id, user_id, amount, credit_type, transaction_type,
                      reference_id, description, created_at
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.amount)
        .bind(entry.credit_type)
        .bind(entry.transaction_type)
        .bind(entry.reference_id)
        .bind(&entry.description)
        .fetch_one(&mut **tx)
        .await?;

        Ok(transaction)
    }
}
