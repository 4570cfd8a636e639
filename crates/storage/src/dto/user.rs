use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::credits::BalanceResponse;
use crate::models::{User, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: UserRole,
    pub referral_code: String,
    pub referred: bool,
    pub balance: BalanceResponse,
}

impl ProfileResponse {
    pub fn new(user: User, balance: BalanceResponse) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            role: user.role,
            referral_code: user.referral_code,
            referred: user.referred_by.is_some(),
            balance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ClaimReferralRequest {
    #[validate(length(equal = 8, message = "Referral codes are 8 characters"))]
    pub code: String,
}
