use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Provider that confirmed a payment; rows in `payment_events` are keyed by it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Stripe,
    Paypal,
}
