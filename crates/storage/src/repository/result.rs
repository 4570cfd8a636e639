use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::CompetitionResult;

#[derive(Debug, Clone, PartialEq)]
pub struct NewResult {
    pub user_id: Uuid,
    pub rank: i32,
    pub score: i32,
    pub time_taken_ms: Option<i64>,
    pub prize: Decimal,
    pub trophy: bool,
}

pub struct ResultRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ResultRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Final leaderboard of a competition
    pub async fn list_for_competition(&self, competition_id: Uuid) -> Result<Vec<CompetitionResult>> {
        let results = sqlx::query_as::<_, CompetitionResult>(
            r#"
            SELECT result_id, competition_id, user_id, rank, score, time_taken_ms, prize,
                   trophy, created_at
            FROM competition_results
            WHERE competition_id = $1
            ORDER BY rank ASC, time_taken_ms ASC NULLS LAST
            "#,
        )
        .bind(competition_id)
        .fetch_all(self.pool)
        .await?;

        Ok(results)
    }

    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        competition_id: Uuid,
        result: &NewResult,
    ) -> Result<CompetitionResult> {
        let row = sqlx::query_as::<_, CompetitionResult>(
            r#"
            INSERT INTO competition_results (
                competition_id, user_id, rank, score, time_taken_ms, prize, trophy
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING result_id, competition_id, user_id, rank, score, time_taken_ms, prize,
                      trophy, created_at
            "#,
        )
        .bind(competition_id)
        .bind(result.user_id)
        .bind(result.rank)
        .bind(result.score)
        .bind(result.time_taken_ms)
        .bind(result.prize)
        .bind(result.trophy)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row)
    }
}
