use axum::{Router, routing::post};

use super::handlers::register_competition;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/register-competition", post(register_competition))
}
