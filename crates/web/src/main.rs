use anyhow::Context;
use storage::Database;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod payments;
mod routes;
mod state;

use config::Config;
use features::{competitions, credits, payments as payment_features, registrations, users};
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        competitions::handlers::list_competitions,
        competitions::handlers::get_competition,
        competitions::handlers::get_results,
        competitions::handlers::create_competition,
        competitions::handlers::update_status,
        competitions::handlers::settle_competition,
        competitions::handlers::list_registrations,
        competitions::handlers::cancel_registration,
        competitions::handlers::submit_score,
        registrations::handlers::register_competition,
        credits::handlers::get_balance,
        credits::handlers::purchase_credits,
        credits::handlers::list_transactions,
        credits::handlers::grant_credits,
        payment_features::handlers::stripe_webhook,
        payment_features::handlers::create_paypal_order,
        payment_features::handlers::capture_paypal_order,
        users::handlers::get_me,
        users::handlers::claim_referral,
    ),
    components(
        schemas(
            storage::dto::competition::CreateCompetitionRequest,
            storage::dto::competition::UpdateCompetitionStatusRequest,
            storage::dto::competition::CompetitionResponse,
            storage::dto::competition::LeaderboardEntry,
            storage::dto::competition::SubmitScoreRequest,
            storage::dto::registration::RegisterCompetitionRequest,
            storage::dto::registration::RegisterCompetitionResponse,
            storage::dto::registration::RegistrationResponse,
            storage::dto::credits::BalanceResponse,
            storage::dto::credits::TransactionResponse,
            storage::dto::credits::PurchaseCreditsRequest,
            storage::dto::credits::GrantCreditsRequest,
            storage::dto::payment::CheckoutResponse,
            storage::dto::payment::CaptureResponse,
            storage::dto::payment::CreatePayPalOrderRequest,
            storage::dto::payment::WebhookAck,
            storage::dto::user::ProfileResponse,
            storage::dto::user::ClaimReferralRequest,
            storage::dto::common::PaginationMeta,
            storage::models::CompetitionStatus,
            storage::models::RegistrationStatus,
            storage::models::PaymentMethod,
            storage::models::PaymentProvider,
            storage::models::CreditType,
            storage::models::TransactionType,
            storage::models::UserRole,
        )
    ),
    tags(
        (name = "competitions", description = "Competition lifecycle, results and settlement"),
        (name = "registrations", description = "Entering, cancelling and scoring"),
        (name = "credits", description = "Credit balances and purchases"),
        (name = "payments", description = "Stripe and PayPal reconciliation"),
        (name = "users", description = "Profiles and referrals"),
        (name = "admin", description = "Operator endpoints"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT or API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Pitchside API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    if config.stripe_secret_key.is_empty() {
        tracing::warn!("STRIPE_SECRET_KEY not set, Stripe checkouts will fail");
    }
    if config.stripe_webhook_secret.is_empty() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set, Stripe webhooks will be refused");
    }
    if config.paypal_client_id.is_empty() {
        tracing::warn!("PAYPAL_CLIENT_ID not set, PayPal orders will fail");
    }

    let bind_address = config.bind_address();
    let state = AppState::new(db, config).context("Failed to build application state")?;

    let app = routes::router(state).merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
