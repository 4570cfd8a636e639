//! Competition lifecycle: creation with a tier-derived fee and forward-only
//! status changes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::ledger::LedgerError;
use super::pricing;
use crate::error::Result;
use crate::models::{Competition, CompetitionStatus};
use crate::repository::competition::CompetitionRepository;

/// Create a competition. The name must match a tier and is stored in its
/// canonical spelling so later fee lookups resolve to the same tier.
pub async fn create_competition(
    pool: &PgPool,
    name: &str,
    start_time: DateTime<Utc>,
) -> Result<Competition> {
    let tier = pricing::tier_for(name)?;

    let repo = CompetitionRepository::new(pool);
    let competition = repo.create(tier.name, start_time, tier.entry_fee()).await?;

    tracing::info!(
        competition_id = %competition.competition_id,
        tier = tier.name,
        entry_fee = %competition.entry_fee,
        "Competition created"
    );

    Ok(competition)
}

pub async fn update_status(
    pool: &PgPool,
    competition_id: Uuid,
    status: CompetitionStatus,
) -> Result<Competition> {
    let mut tx = pool.begin().await?;

    let current = CompetitionRepository::lock(&mut tx, competition_id).await?;
    if current.status == status {
        tx.rollback().await?;
        return Ok(current);
    }
    if !current.status.can_transition_to(status) {
        return Err(LedgerError::InvalidStatusTransition {
            from: current.status.as_str().to_string(),
            to: status.as_str().to_string(),
        }
        .into());
    }

    let updated = CompetitionRepository::set_status(&mut tx, competition_id, status).await?;
    tx.commit().await?;

    tracing::info!(
        %competition_id,
        from = current.status.as_str(),
        to = status.as_str(),
        "Competition status changed"
    );

    Ok(updated)
}
