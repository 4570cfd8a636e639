use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::PaymentProvider;

/// Where to send the user to complete a payment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub provider: PaymentProvider,
    /// Stripe checkout session id or PayPal order id
    pub reference: String,
    pub checkout_url: String,
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaptureResponse {
    pub order_id: String,
    pub status: String,
    pub credited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePayPalOrderRequest {
    #[validate(range(min = 1, max = 1000, message = "credits must be between 1 and 1000"))]
    pub credits: i64,
}
