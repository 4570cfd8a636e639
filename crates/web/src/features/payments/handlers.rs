use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use storage::{
    dto::payment::{CaptureResponse, CheckoutResponse, CreatePayPalOrderRequest, WebhookAck},
    models::PaymentProvider,
    services::{credits::purchase_price_cents, users},
};
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::AuthUser;
use crate::payments::{
    CheckoutPurpose,
    stripe::{SignatureError, StripeEvent},
};
use crate::state::AppState;

use super::services::{self, WebhookOutcome};

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

#[utoipa::path(
    post,
    path = "/api/stripe-webhook",
    request_body(content = String, description = "Raw Stripe event payload", content_type = "application/json"),
    params(
        ("Stripe-Signature" = String, Header, description = "Stripe webhook signature")
    ),
    responses(
        (status = 200, description = "Event received", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature, or malformed event"),
        (status = 503, description = "Webhook signing secret not configured")
    ),
    tag = "payments"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| WebError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    state
        .stripe
        .verify_webhook(&body, signature, Utc::now().timestamp())
        .map_err(|e| match e {
            SignatureError::NotConfigured => {
                tracing::error!("Stripe webhook received but STRIPE_WEBHOOK_SECRET is not set");
                WebError::ServiceUnavailable("Stripe webhooks are not configured".to_string())
            }
            e => {
                tracing::warn!("Rejected Stripe webhook: {}", e);
                WebError::BadRequest(format!("Invalid signature: {}", e))
            }
        })?;

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| WebError::BadRequest(format!("Malformed event: {}", e)))?;

    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Stripe event received");

    let outcome = services::handle_stripe_event(state.db.pool(), &event).await?;

    Ok(Json(WebhookAck {
        received: true,
        duplicate: outcome == WebhookOutcome::Duplicate,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/paypal/orders",
    request_body = CreatePayPalOrderRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "PayPal order created", body = CheckoutResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "PayPal unavailable")
    ),
    tag = "payments"
)]
pub async fn create_paypal_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreatePayPalOrderRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    users::ensure_user(state.db.pool(), user.user_id, user.email.as_deref()).await?;

    let amount_cents = purchase_price_cents(req.credits, state.config.credit_unit_price_cents)?;
    let purpose = CheckoutPurpose::Credits {
        user_id: user.user_id,
        credits: req.credits,
    };

    let checkout = services::start_checkout(
        &state,
        PaymentProvider::Paypal,
        &purpose,
        &format!("{} Pitchside credits", req.credits),
        amount_cents,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(checkout)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/paypal/orders/{order_id}/capture",
    params(
        ("order_id" = String, Path, description = "PayPal order ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Order captured", body = CaptureResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Order belongs to another user"),
        (status = 502, description = "PayPal unavailable")
    ),
    tag = "payments"
)]
pub async fn capture_paypal_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> Result<Response, WebError> {
    let capture = services::capture_paypal_order(&state, &user, &order_id).await?;

    Ok(Json(capture).into_response())
}
