use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::PgPool;
use storage::{
    models::{CompetitionStatus, CreditType, UserRole},
    repository::{registration::RegistrationRepository, user::UserRepository},
    services::{competitions, credits, registration, settlement},
};
use uuid::Uuid;

pub async fn grant_credits(
    pool: &PgPool,
    user_id: Uuid,
    credit_type: CreditType,
    amount: Decimal,
    reason: Option<String>,
) -> anyhow::Result<()> {
    let reason = reason.or_else(|| Some("Granted from pitchside-ops".to_string()));
    let balance = credits::grant_credits(pool, user_id, credit_type, amount, reason)
        .await
        .with_context(|| format!("Failed to grant credits to {}", user_id))?;

    tracing::info!(
        "Balance for {}: referral {}, winnings {}, purchased {}",
        user_id,
        balance.referral_credits,
        balance.winnings_credits,
        balance.purchased_credits
    );

    Ok(())
}

pub async fn set_status(
    pool: &PgPool,
    competition_id: Uuid,
    status: CompetitionStatus,
) -> anyhow::Result<()> {
    let competition = competitions::update_status(pool, competition_id, status)
        .await
        .with_context(|| format!("Failed to update competition {}", competition_id))?;

    tracing::info!("{} is now {}", competition.name, competition.status.as_str());

    Ok(())
}

pub async fn settle(pool: &PgPool, competition_id: Uuid) -> anyhow::Result<()> {
    let results = settlement::settle_competition(pool, competition_id)
        .await
        .with_context(|| format!("Failed to settle competition {}", competition_id))?;

    for result in &results {
        tracing::info!(
            rank = result.rank,
            user_id = %result.user_id,
            score = result.score,
            prize = %result.prize,
            trophy = result.trophy,
            "Settled entry"
        );
    }
    let paid: Decimal = results.iter().map(|r| r.prize).sum();
    tracing::info!("Settled {} entries, {} credits paid", results.len(), paid);

    Ok(())
}

pub async fn expire_pending(
    pool: &PgPool,
    older_than_minutes: i64,
    dry_run: bool,
) -> anyhow::Result<()> {
    let stale = RegistrationRepository::new(pool)
        .list_stale_pending(older_than_minutes)
        .await
        .context("Failed to list pending registrations")?;

    if stale.is_empty() {
        tracing::info!("No pending registrations older than {} minutes", older_than_minutes);
        return Ok(());
    }

    let mut expired = 0;
    for entry in stale {
        if dry_run {
            tracing::info!(
                "Would expire {} ({:?}, reference {})",
                entry.registration_id,
                entry.payment_method,
                entry.external_reference.as_deref().unwrap_or("none")
            );
            continue;
        }

        let mut tx = pool.begin().await?;
        if registration::expire_pending(&mut tx, entry.registration_id)
            .await?
            .is_some()
        {
            expired += 1;
        }
        tx.commit().await?;
    }

    if !dry_run {
        tracing::info!("Expired {} pending registrations", expired);
    }

    Ok(())
}

pub async fn promote_admin(pool: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
    let user = UserRepository::new(pool)
        .set_role(user_id, UserRole::Admin)
        .await
        .with_context(|| format!("Failed to promote {}", user_id))?;

    tracing::info!(
        "{} ({}) is now an admin",
        user.user_id,
        user.email.as_deref().unwrap_or("no email")
    );

    Ok(())
}
