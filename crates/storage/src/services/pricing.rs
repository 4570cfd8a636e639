//! Entry fees and prize tables for each competition tier.
//!
//! Prices are decided here and nowhere else. Any amount a client sends along
//! with a registration is ignored.

use rust_decimal::Decimal;

use super::ledger::LedgerError;

/// Share of the collected entry fees kept by the house, in percent
pub const HOUSE_RAKE_PERCENT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub name: &'static str,
    /// Entry fee in hundredths of a credit
    pub entry_fee_cents: i64,
    /// Percentage of the prize pool for each paid place, best first
    pub prize_shares: &'static [u32],
}

impl Tier {
    pub fn entry_fee(&self) -> Decimal {
        Decimal::new(self.entry_fee_cents, 2)
    }
}

pub const TIERS: &[Tier] = &[
    Tier {
        name: "Sunday League",
        entry_fee_cents: 100,
        prize_shares: &[100],
    },
    Tier {
        name: "Championship",
        entry_fee_cents: 500,
        prize_shares: &[60, 40],
    },
    Tier {
        name: "Premier League",
        entry_fee_cents: 1000,
        prize_shares: &[50, 30, 20],
    },
    Tier {
        name: "Champions League",
        entry_fee_cents: 2500,
        prize_shares: &[40, 25, 15, 12, 8],
    },
];

fn canonical(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Look up the tier a competition name belongs to
pub fn tier_for(name: &str) -> Result<&'static Tier, LedgerError> {
    let wanted = canonical(name);
    TIERS
        .iter()
        .find(|tier| canonical(tier.name) == wanted)
        .ok_or_else(|| LedgerError::UnknownTier(name.trim().to_string()))
}

/// Authoritative entry fee for a competition name
pub fn entry_fee_for(name: &str) -> Result<Decimal, LedgerError> {
    tier_for(name).map(Tier::entry_fee)
}

/// Prize pool left after the house rake, rounded down to cents
pub fn prize_pool(collected: Decimal) -> Decimal {
    let pool = collected * Decimal::from(100 - HOUSE_RAKE_PERCENT) / Decimal::from(100);
    pool.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::ToZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_and_space_insensitive() {
        assert_eq!(
            entry_fee_for("  premier   LEAGUE ").unwrap(),
            Decimal::new(1000, 2)
        );
        assert_eq!(entry_fee_for("Sunday League").unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        assert_eq!(
            entry_fee_for("Pub Quiz"),
            Err(LedgerError::UnknownTier("Pub Quiz".to_string()))
        );
    }

    #[test]
    fn test_prize_shares_sum_to_hundred() {
        for tier in TIERS {
            assert_eq!(tier.prize_shares.iter().sum::<u32>(), 100, "{}", tier.name);
        }
    }

    #[test]
    fn test_prize_pool_takes_rake() {
        assert_eq!(prize_pool(Decimal::from(100)), Decimal::from(90));
        assert_eq!(prize_pool(Decimal::new(333, 2)), Decimal::new(299, 2));
    }
}
