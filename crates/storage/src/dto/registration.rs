use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{CompetitionRegistration, PaymentMethod, RegistrationStatus};

/// Request payload for entering a competition
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterCompetitionRequest {
    pub competition_id: Uuid,

    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,

    /// What the client believes the entry costs. Never used for charging.
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Credits
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    pub registration_id: Uuid,
    pub competition_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    pub payment_method: PaymentMethod,
    pub paid_amount: Decimal,
    pub referral_used: Decimal,
    pub winnings_used: Decimal,
    pub purchased_used: Decimal,
    pub score: Option<i32>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CompetitionRegistration> for RegistrationResponse {
    fn from(reg: CompetitionRegistration) -> Self {
        Self {
            registration_id: reg.registration_id,
            competition_id: reg.competition_id,
            user_id: reg.user_id,
            status: reg.status,
            payment_method: reg.payment_method,
            paid_amount: reg.paid_amount,
            referral_used: reg.referral_used,
            winnings_used: reg.winnings_used,
            purchased_used: reg.purchased_used,
            score: reg.score,
            submitted_at: reg.submitted_at,
            created_at: reg.created_at,
        }
    }
}

/// Query filter for a competition's registrations
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatus>,
}

/// Result of a registration call
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterCompetitionResponse {
    pub registration: RegistrationResponse,
    /// A new registration was written
    pub created: bool,
    /// An existing registration changed status or payment method
    pub updated: bool,
    /// Where to send the user to finish paying, for card/PayPal entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_defaults_to_credits() {
        let req: RegisterCompetitionRequest = serde_json::from_str(
            r#"{"competition_id": "7f0c8a4e-3b4b-4c1c-9a57-5b1f0e4b3a21", "paid_amount": "0.01"}"#,
        )
        .unwrap();
        assert_eq!(req.payment_method, PaymentMethod::Credits);
        assert_eq!(req.paid_amount, Some(Decimal::new(1, 2)));
    }

    #[test]
    fn test_response_reports_in_place_update() {
        let now = Utc::now();
        let response = RegisterCompetitionResponse {
            registration: RegistrationResponse {
                registration_id: Uuid::new_v4(),
                competition_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                status: RegistrationStatus::Confirmed,
                payment_method: PaymentMethod::Credits,
                paid_amount: Decimal::from(5),
                referral_used: Decimal::ZERO,
                winnings_used: Decimal::ZERO,
                purchased_used: Decimal::from(5),
                score: None,
                submitted_at: None,
                created_at: now,
            },
            created: false,
            updated: true,
            checkout_url: None,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["created"], false);
        assert_eq!(value["updated"], true);
        assert!(value.get("checkout_url").is_none());
    }
}
