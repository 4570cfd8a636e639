use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use super::handlers::{
    cancel_registration, create_competition, get_competition, get_results, list_competitions,
    list_registrations, settle_competition, submit_score, update_status,
};
use crate::middleware::auth::require_admin;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create_competition))
        .route("/:id/status", patch(update_status))
        .route("/:id/settle", post(settle_competition))
        .route("/:id/registrations", get(list_registrations))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/", get(list_competitions))
        .route("/:id", get(get_competition))
        .route("/:id/results", get(get_results))
        .route("/:id/cancel", post(cancel_registration))
        .route("/:id/scores", post(submit_score))
        .merge(admin)
}
