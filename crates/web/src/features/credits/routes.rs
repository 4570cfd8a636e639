use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{get_balance, grant_credits, list_transactions, purchase_credits};
use crate::middleware::auth::require_admin;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_balance).post(purchase_credits))
        .route("/transactions", get(list_transactions))
}

pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/grant", post(grant_credits))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
