use axum::{Router, routing::post};

use super::handlers::{capture_paypal_order, create_paypal_order, stripe_webhook};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stripe-webhook", post(stripe_webhook))
        .route("/paypal/orders", post(create_paypal_order))
        .route("/paypal/orders/:order_id/capture", post(capture_paypal_order))
}
