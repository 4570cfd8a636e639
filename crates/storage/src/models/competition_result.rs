use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompetitionResult {
    pub result_id: Uuid,
    pub competition_id: Uuid,
    pub user_id: Uuid,
    pub rank: i32,
    pub score: i32,
    pub time_taken_ms: Option<i64>,
    pub prize: Decimal,
    pub trophy: bool,
    pub created_at: DateTime<Utc>,
}
