use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::ledger::CreditPools;

/// One row per user holding the three credit pools
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CreditBalance {
    pub user_id: Uuid,
    pub purchased_credits: Decimal,
    pub winnings_credits: Decimal,
    pub referral_credits: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl CreditBalance {
    /// Balance for a user that has no row yet
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            purchased_credits: Decimal::ZERO,
            winnings_credits: Decimal::ZERO,
            referral_credits: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    pub fn pools(&self) -> CreditPools {
        CreditPools {
            referral: self.referral_credits,
            winnings: self.winnings_credits,
            purchased: self.purchased_credits,
        }
    }
}
