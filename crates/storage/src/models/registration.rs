use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::ledger::Deduction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Credits,
    Stripe,
    Paypal,
}

impl PaymentMethod {
    /// Status a fresh registration lands in for this payment method
    pub fn target_status(&self) -> RegistrationStatus {
        match self {
            Self::Credits => RegistrationStatus::Confirmed,
            Self::Stripe | Self::Paypal => RegistrationStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompetitionRegistration {
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub competition_id: Uuid,
    pub paid_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_type: String,
    pub status: RegistrationStatus,
    pub referral_used: Decimal,
    pub winnings_used: Decimal,
    pub purchased_used: Decimal,
    pub external_reference: Option<String>,
    pub score: Option<i32>,
    pub correct_answers: Option<i32>,
    pub total_questions: Option<i32>,
    pub time_taken_ms: Option<i64>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompetitionRegistration {
    /// The credit deduction recorded against this entry
    pub fn deduction(&self) -> Deduction {
        Deduction {
            referral: self.referral_used,
            winnings: self.winnings_used,
            purchased: self.purchased_used,
        }
    }

    pub fn has_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}
