use sqlx::{Postgres, Transaction};

use crate::error::Result;
use crate::models::PaymentProvider;

/// Ledger of provider events that have already been applied
pub struct PaymentEventRepository;

impl PaymentEventRepository {
    /// Claim an event id for processing.
    ///
    /// Returns false when the event was already recorded, in which case the
    /// caller must not apply it again.
    pub async fn claim(
        tx: &mut Transaction<'_, Postgres>,
        provider: PaymentProvider,
        event_id: &str,
        event_type: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_events (provider, event_id, event_type)
            VALUES ($1, $2, $3)
            ON CONFLICT (provider, event_id) DO NOTHING
            "#,
        )
        .bind(provider)
        .bind(event_id)
        .bind(event_type)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
