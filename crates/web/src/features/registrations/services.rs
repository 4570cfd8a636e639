use storage::{
    dto::registration::{RegisterCompetitionRequest, RegisterCompetitionResponse, RegistrationResponse},
    models::{PaymentMethod, PaymentProvider, RegistrationStatus},
    repository::registration::RegistrationRepository,
    services::{pricing, registration, users},
};

use crate::error::WebResult;
use crate::features::payments::services::{open_checkout_url, start_checkout};
use crate::middleware::auth::AuthUser;
use crate::payments::CheckoutPurpose;
use crate::state::AppState;

fn provider_for(method: PaymentMethod) -> Option<PaymentProvider> {
    match method {
        PaymentMethod::Credits => None,
        PaymentMethod::Stripe => Some(PaymentProvider::Stripe),
        PaymentMethod::Paypal => Some(PaymentProvider::Paypal),
    }
}

/// Register the caller and, for card payments, open a checkout for the
/// pending entry.
pub async fn register(
    state: &AppState,
    user: &AuthUser,
    req: &RegisterCompetitionRequest,
) -> WebResult<RegisterCompetitionResponse> {
    let pool = state.db.pool();

    users::ensure_user(pool, user.user_id, user.email.as_deref()).await?;

    let outcome = registration::register_for_competition(
        pool,
        user.user_id,
        req.competition_id,
        req.payment_method,
        req.paid_amount,
    )
    .await?;

    let mut checkout_url = None;
    if outcome.registration.status == RegistrationStatus::Pending
        && let Some(provider) = provider_for(outcome.registration.payment_method)
    {
        let pending = &outcome.registration;

        if !outcome.created
            && !outcome.updated
            && let Some(reference) = pending.external_reference.as_deref()
        {
            checkout_url = open_checkout_url(state, provider, reference).await?;
            if checkout_url.is_some() {
                tracing::debug!(
                    registration_id = %pending.registration_id,
                    reference,
                    "Reusing open checkout for pending registration"
                );
            }
        }

        if checkout_url.is_none() {
            let tier = pricing::tier_for(&outcome.competition.name)?;
            let purpose = CheckoutPurpose::CompetitionEntry {
                user_id: user.user_id,
                registration_id: pending.registration_id,
            };

            let checkout = start_checkout(
                state,
                provider,
                &purpose,
                &format!("Entry: {}", outcome.competition.name),
                tier.entry_fee_cents,
            )
            .await?;

            RegistrationRepository::new(pool)
                .set_external_reference(pending.registration_id, &checkout.reference)
                .await?;

            checkout_url = Some(checkout.checkout_url);
        }
    }

    Ok(RegisterCompetitionResponse {
        registration: RegistrationResponse::from(outcome.registration),
        created: outcome.created,
        updated: outcome.updated,
        checkout_url,
    })
}
