use std::sync::Arc;

use axum::extract::FromRef;
use storage::Database;

use crate::config::Config;
use crate::middleware::auth::{ApiKeys, JwtVerifier};
use crate::payments::{PayPalClient, StripeClient};

/// Everything handlers share, cloned into each request
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub api_keys: ApiKeys,
    pub jwt: JwtVerifier,
    pub stripe: StripeClient,
    pub paypal: PayPalClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> anyhow::Result<Self> {
        let stripe = StripeClient::new(
            config.stripe_secret_key.clone(),
            config.stripe_webhook_secret.clone(),
        )?;
        let paypal = PayPalClient::new(
            config.paypal_api_base.clone(),
            config.paypal_client_id.clone(),
            config.paypal_client_secret.clone(),
        )?;

        Ok(Self {
            db,
            api_keys: ApiKeys::from_comma_separated(&config.api_keys),
            jwt: JwtVerifier::new(&config.jwt_secret),
            stripe,
            paypal,
            config: Arc::new(config),
        })
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for JwtVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
