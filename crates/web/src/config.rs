use anyhow::{Context, Result};
use rust_decimal::Decimal;

const DEFAULT_PAYPAL_API_BASE: &str = "https://api-m.sandbox.paypal.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub api_keys: String,
    pub jwt_secret: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub paypal_client_id: String,
    pub paypal_client_secret: String,
    pub paypal_api_base: String,
    pub public_base_url: String,
    pub credit_unit_price_cents: i64,
    pub currency: String,
    pub referral_bonus: Decimal,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            jwt_secret: std::env::var("SUPABASE_JWT_SECRET")
                .context("Cannot load SUPABASE_JWT_SECRET env variable")?,
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            paypal_client_id: std::env::var("PAYPAL_CLIENT_ID").unwrap_or_default(),
            paypal_client_secret: std::env::var("PAYPAL_CLIENT_SECRET").unwrap_or_default(),
            paypal_api_base: std::env::var("PAYPAL_API_BASE")
                .unwrap_or_else(|_| DEFAULT_PAYPAL_API_BASE.to_string()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .context("Cannot load PUBLIC_BASE_URL env variable")?
                .trim_end_matches('/')
                .to_string(),
            credit_unit_price_cents: match std::env::var("CREDIT_UNIT_PRICE_CENTS") {
                Ok(value) => value
                    .parse()
                    .context("CREDIT_UNIT_PRICE_CENTS must be a number")?,
                Err(_) => 100,
            },
            currency: std::env::var("CURRENCY")
                .unwrap_or_else(|_| "usd".to_string())
                .to_lowercase(),
            referral_bonus: match std::env::var("REFERRAL_BONUS") {
                Ok(value) => value
                    .parse()
                    .context("REFERRAL_BONUS must be a decimal number")?,
                Err(_) => Decimal::from(2),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
