//! Credit ledger arithmetic.
//!
//! Every entry fee is paid from the three pools in a fixed order: referral
//! credits first, then winnings, then purchased credits. These functions are
//! pure; the repositories persist whatever they return.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::CreditType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredits {
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Unknown competition tier: {0}")]
    UnknownTier(String),

    #[error("Registration is closed for this competition")]
    RegistrationClosed,

    #[error("Already registered for this competition")]
    AlreadyRegistered,

    #[error("Not registered for this competition")]
    NotRegistered,

    #[error("Score already submitted")]
    ScoreAlreadySubmitted,

    #[error("Invalid score: {0}")]
    InvalidScore(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Competition already settled")]
    AlreadySettled,

    #[error("Competition cannot be settled: {0}")]
    NotSettleable(String),

    #[error("Referral rejected: {0}")]
    ReferralRejected(String),
}

/// A user's three credit pools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreditPools {
    pub referral: Decimal,
    pub winnings: Decimal,
    pub purchased: Decimal,
}

/// How much an allocation took from each pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Deduction {
    pub referral: Decimal,
    pub winnings: Decimal,
    pub purchased: Decimal,
}

impl CreditPools {
    pub fn total(&self) -> Decimal {
        self.referral + self.winnings + self.purchased
    }

    /// Pools after taking `deduction` out of them
    pub fn apply(&self, deduction: &Deduction) -> CreditPools {
        CreditPools {
            referral: self.referral - deduction.referral,
            winnings: self.winnings - deduction.winnings,
            purchased: self.purchased - deduction.purchased,
        }
    }

    /// Pools after giving `deduction` back, pool for pool
    pub fn refund(&self, deduction: &Deduction) -> CreditPools {
        CreditPools {
            referral: self.referral + deduction.referral,
            winnings: self.winnings + deduction.winnings,
            purchased: self.purchased + deduction.purchased,
        }
    }

    /// Pools after adding `amount` to a single pool
    pub fn credit(&self, pool: CreditType, amount: Decimal) -> CreditPools {
        let mut next = *self;
        match pool {
            CreditType::Referral => next.referral += amount,
            CreditType::Winnings => next.winnings += amount,
            CreditType::Purchased => next.purchased += amount,
        }
        next
    }
}

impl Deduction {
    pub fn total(&self) -> Decimal {
        self.referral + self.winnings + self.purchased
    }

    pub fn is_empty(&self) -> bool {
        self.total().is_zero()
    }

    /// Non-zero portions in deduction order
    pub fn parts(&self) -> Vec<(CreditType, Decimal)> {
        [
            (CreditType::Referral, self.referral),
            (CreditType::Winnings, self.winnings),
            (CreditType::Purchased, self.purchased),
        ]
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .collect()
    }
}

/// Split `cost` across the pools, referral first, then winnings, then purchased.
///
/// Fails without touching anything when the pools together hold less than
/// `cost`.
pub fn allocate(pools: &CreditPools, cost: Decimal) -> Result<Deduction, LedgerError> {
    if cost < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(cost));
    }

    let mut remaining = cost;

    let referral = pools.referral.min(remaining).max(Decimal::ZERO);
    remaining -= referral;

    let winnings = pools.winnings.min(remaining).max(Decimal::ZERO);
    remaining -= winnings;

    let purchased = pools.purchased.min(remaining).max(Decimal::ZERO);
    remaining -= purchased;

    if remaining > Decimal::ZERO {
        return Err(LedgerError::InsufficientCredits {
            required: cost,
            available: pools.total(),
        });
    }

    Ok(Deduction {
        referral,
        winnings,
        purchased,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pools(r: i64, w: i64, p: i64) -> CreditPools {
        CreditPools {
            referral: Decimal::from(r),
            winnings: Decimal::from(w),
            purchased: Decimal::from(p),
        }
    }

    #[test]
    fn test_referral_is_spent_first() {
        let deduction = allocate(&pools(3, 5, 10), Decimal::from(2)).unwrap();
        assert_eq!(deduction.referral, Decimal::from(2));
        assert_eq!(deduction.winnings, Decimal::ZERO);
        assert_eq!(deduction.purchased, Decimal::ZERO);
    }

    #[test]
    fn test_spills_over_into_winnings_then_purchased() {
        let deduction = allocate(&pools(3, 5, 10), Decimal::from(10)).unwrap();
        assert_eq!(deduction.referral, Decimal::from(3));
        assert_eq!(deduction.winnings, Decimal::from(5));
        assert_eq!(deduction.purchased, Decimal::from(2));
    }

    #[test]
    fn test_exact_balance_empties_every_pool() {
        let start = pools(1, 2, 3);
        let deduction = allocate(&start, Decimal::from(6)).unwrap();
        assert_eq!(start.apply(&deduction), CreditPools::default());
    }

    #[test]
    fn test_insufficient_credits_reports_totals() {
        let err = allocate(&pools(1, 1, 1), Decimal::from(5)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientCredits {
                required: Decimal::from(5),
                available: Decimal::from(3),
            }
        );
    }

    #[test]
    fn test_zero_cost_is_empty_deduction() {
        let deduction = allocate(&pools(1, 1, 1), Decimal::ZERO).unwrap();
        assert!(deduction.is_empty());
        assert!(deduction.parts().is_empty());
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let err = allocate(&pools(1, 1, 1), Decimal::from(-1)).unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount(Decimal::from(-1)));
    }

    #[test]
    fn test_fractional_amounts() {
        let start = CreditPools {
            referral: Decimal::new(50, 2),
            winnings: Decimal::new(125, 2),
            purchased: Decimal::new(1000, 2),
        };
        let deduction = allocate(&start, Decimal::new(500, 2)).unwrap();
        assert_eq!(deduction.referral, Decimal::new(50, 2));
        assert_eq!(deduction.winnings, Decimal::new(125, 2));
        assert_eq!(deduction.purchased, Decimal::new(325, 2));
    }

    #[test]
    fn test_sufficient_pools_consume_exactly_cost_in_order() {
        for r in 0..5 {
            for w in 0..5 {
                for p in 0..5 {
                    let start = pools(r, w, p);
                    for c in 0..=(r + w + p) {
                        let cost = Decimal::from(c);
                        let deduction = allocate(&start, cost).unwrap();
                        let after = start.apply(&deduction);

                        assert_eq!(deduction.total(), cost);
                        assert!(after.referral >= Decimal::ZERO);
                        assert!(after.winnings >= Decimal::ZERO);
                        assert!(after.purchased >= Decimal::ZERO);
                        // a later pool is only touched once the earlier ones are empty
                        if !deduction.winnings.is_zero() {
                            assert!(after.referral.is_zero());
                        }
                        if !deduction.purchased.is_zero() {
                            assert!(after.referral.is_zero());
                            assert!(after.winnings.is_zero());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_insufficient_pools_fail_without_mutation() {
        for r in 0..4 {
            for w in 0..4 {
                for p in 0..4 {
                    let start = pools(r, w, p);
                    let snapshot = start;
                    let cost = Decimal::from(r + w + p + 1);
                    assert!(matches!(
                        allocate(&start, cost),
                        Err(LedgerError::InsufficientCredits { .. })
                    ));
                    assert_eq!(start, snapshot);
                }
            }
        }
    }

    #[test]
    fn test_refund_restores_original_pools() {
        let start = pools(2, 4, 7);
        let deduction = allocate(&start, Decimal::from(9)).unwrap();
        let after = start.apply(&deduction);
        assert_eq!(after.refund(&deduction), start);
    }

    #[test]
    fn test_credit_targets_single_pool() {
        let next = pools(0, 0, 0).credit(CreditType::Winnings, Decimal::from(4));
        assert_eq!(next, pools(0, 4, 0));
    }
}
