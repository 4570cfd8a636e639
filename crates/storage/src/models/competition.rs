use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CompetitionStatus {
    Scheduled,
    Live,
    Finished,
}

impl CompetitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Finished => "finished",
        }
    }

    /// Status moves forward one step at a time
    pub fn can_transition_to(&self, next: CompetitionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Live) | (Self::Live, Self::Finished)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Competition {
    pub competition_id: Uuid,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub entry_fee: Decimal,
    pub status: CompetitionStatus,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_moves_forward_only() {
        use CompetitionStatus::*;
        assert!(Scheduled.can_transition_to(Live));
        assert!(Live.can_transition_to(Finished));
        assert!(!Scheduled.can_transition_to(Finished));
        assert!(!Finished.can_transition_to(Live));
        assert!(!Live.can_transition_to(Live));
    }
}
