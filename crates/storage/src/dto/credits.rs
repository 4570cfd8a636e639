use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreditBalance, CreditTransaction, CreditType, PaymentProvider, TransactionType};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub referral_credits: Decimal,
    pub winnings_credits: Decimal,
    pub purchased_credits: Decimal,
    pub total_credits: Decimal,
}

impl From<CreditBalance> for BalanceResponse {
    fn from(balance: CreditBalance) -> Self {
        let total = balance.pools().total();
        Self {
            user_id: balance.user_id,
            referral_credits: balance.referral_credits,
            winnings_credits: balance.winnings_credits,
            purchased_credits: balance.purchased_credits,
            total_credits: total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub credit_type: CreditType,
    pub transaction_type: TransactionType,
    pub reference_id: Option<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CreditTransaction> for TransactionResponse {
    fn from(tx: CreditTransaction) -> Self {
        Self {
            transaction_id: tx.transaction_id,
            amount: tx.amount,
            credit_type: tx.credit_type,
            transaction_type: tx.transaction_type,
            reference_id: tx.reference_id,
            description: tx.description,
            created_at: tx.created_at,
        }
    }
}

/// Start buying a pack of purchased credits
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseCreditsRequest {
    #[validate(range(min = 1, max = 1000, message = "credits must be between 1 and 1000"))]
    pub credits: i64,

    #[serde(default = "default_provider")]
    pub provider: PaymentProvider,
}

fn default_provider() -> PaymentProvider {
    PaymentProvider::Stripe
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GrantCreditsRequest {
    pub user_id: Uuid,
    pub credit_type: CreditType,
    pub amount: Decimal,
    #[validate(length(max = 255))]
    pub reason: Option<String>,
}

impl GrantCreditsRequest {
    pub fn validate_amount(&self) -> Result<(), &'static str> {
        if self.amount <= Decimal::ZERO {
            return Err("Amount must be positive");
        }
        if self.amount.scale() > 2 {
            return Err("Amount cannot have more than two decimal places");
        }
        Ok(())
    }
}
