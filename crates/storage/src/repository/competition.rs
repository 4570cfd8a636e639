use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Competition, CompetitionStatus};

/// Repository for Competition database operations
pub struct CompetitionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompetitionRepository<'a> {
    /// Create a new CompetitionRepository
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List competitions, soonest first, optionally filtered by status
    pub async fn list(&self, status: Option<CompetitionStatus>) -> Result<Vec<Competition>> {
        let competitions = sqlx::query_as::<_, Competition>(
            r#"
            SELECT competition_id, name, start_time, entry_fee, status, settled_at, created_at
            FROM competitions
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY start_time ASC, created_at ASC
            "#,
        )
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(competitions)
    }

    /// Get a competition by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Competition> {
        let competition = sqlx::query_as::<_, Competition>(
            r#"
            SELECT competition_id, name, start_time, entry_fee, status, settled_at, created_at
            FROM competitions
            WHERE competition_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(competition)
    }

    /// Create a new competition with an already resolved entry fee
    pub async fn create(
        &self,
        name: &str,
        start_time: DateTime<Utc>,
        entry_fee: Decimal,
    ) -> Result<Competition> {
        let competition = sqlx::query_as::<_, Competition>(
            r#"
            INSERT INTO competitions (name, start_time, entry_fee, status)
            VALUES ($1, $2, $3, 'scheduled')
            RETURNING competition_id, name, start_time, entry_fee, status, settled_at, created_at
            "#,
        )
        .bind(name)
        .bind(start_time)
        .bind(entry_fee)
        .fetch_one(self.pool)
        .await?;

        Ok(competition)
    }

    /// Read a competition inside a transaction, blocking status changes until commit
    pub async fn find_for_share(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Competition> {
        let competition = sqlx::query_as::<_, Competition>(
            r#"
            SELECT competition_id, name, start_time, entry_fee, status, settled_at, created_at
            FROM competitions
            WHERE competition_id = $1
            FOR SHARE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(competition)
    }

    /// Lock a competition row for an exclusive update
    pub async fn lock(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Competition> {
        let competition = sqlx::query_as::<_, Competition>(
            r#"
            SELECT competition_id, name, start_time, entry_fee, status, settled_at, created_at
            FROM competitions
            WHERE competition_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(competition)
    }

    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: CompetitionStatus,
    ) -> Result<Competition> {
        let competition = sqlx::query_as::<_, Competition>(
            r#"
            UPDATE competitions
            SET status = $2
            WHERE competition_id = $1
            RETURNING competition_id, name, start_time, entry_fee, status, settled_at, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(competition)
    }

    pub async fn mark_settled(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE competitions
            SET settled_at = NOW()
            WHERE competition_id = $1 AND settled_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
