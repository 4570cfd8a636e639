use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{claim_referral, get_me};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/referrals/claim", post(claim_referral))
}
