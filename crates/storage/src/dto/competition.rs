use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Competition, CompetitionResult, CompetitionStatus};
use crate::services::pricing;

/// Request payload for creating a new competition.
///
/// The entry fee is derived from the tier name; it cannot be supplied.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCompetitionRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    #[validate(custom(function = "validate_tier"))]
    pub name: String,

    pub start_time: DateTime<Utc>,
}

impl CreateCompetitionRequest {
    /// Additional validation that depends on the clock
    pub fn validate_start(&self, now: DateTime<Utc>) -> Result<(), &'static str> {
        if self.start_time <= now {
            return Err("Start time must be in the future");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateCompetitionStatusRequest {
    pub status: CompetitionStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CompetitionFilter {
    pub status: Option<CompetitionStatus>,
}

/// Response containing competition details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitionResponse {
    pub competition_id: Uuid,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub entry_fee: Decimal,
    pub status: CompetitionStatus,
    pub settled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Competition> for CompetitionResponse {
    fn from(comp: Competition) -> Self {
        Self {
            competition_id: comp.competition_id,
            name: comp.name,
            start_time: comp.start_time,
            entry_fee: comp.entry_fee,
            status: comp.status,
            settled: comp.settled_at.is_some(),
            created_at: comp.created_at,
        }
    }
}

/// One line of a settled competition's leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: i32,
    pub user_id: Uuid,
    pub score: i32,
    pub time_taken_ms: Option<i64>,
    pub prize: Decimal,
    pub trophy: bool,
}

impl From<CompetitionResult> for LeaderboardEntry {
    fn from(result: CompetitionResult) -> Self {
        Self {
            rank: result.rank,
            user_id: result.user_id,
            score: result.score,
            time_taken_ms: result.time_taken_ms,
            prize: result.prize,
            trophy: result.trophy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitScoreRequest {
    #[validate(range(min = 0, message = "correct_answers cannot be negative"))]
    pub correct_answers: i32,

    #[validate(range(min = 1, max = 500, message = "total_questions must be between 1 and 500"))]
    pub total_questions: i32,

    #[validate(range(min = 0, message = "time_taken_ms cannot be negative"))]
    pub time_taken_ms: i64,
}

fn validate_tier(name: &str) -> Result<(), validator::ValidationError> {
    pricing::tier_for(name)
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("unknown_tier"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_create_requires_known_tier() {
        let req = CreateCompetitionRequest {
            name: "Championship".to_string(),
            start_time: Utc::now() + Duration::days(1),
        };
        assert!(req.validate().is_ok());

        let bad = CreateCompetitionRequest {
            name: "Kickabout".to_string(),
            ..req
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_start_time_in_past_rejected() {
        let now = Utc::now();
        let req = CreateCompetitionRequest {
            name: "Championship".to_string(),
            start_time: now - Duration::minutes(1),
        };
        assert!(req.validate_start(now).is_err());
    }

    #[test]
    fn test_score_request_ranges() {
        let req = SubmitScoreRequest {
            correct_answers: 3,
            total_questions: 0,
            time_taken_ms: 10,
        };
        assert!(req.validate().is_err());
    }
}
