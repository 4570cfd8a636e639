//! Scoring, ranking and prize payout for finished competitions.

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use uuid::Uuid;

use super::ledger::LedgerError;
use super::pricing;
use crate::error::{Result, StorageError};
use crate::models::{
    CompetitionRegistration, CompetitionResult, CompetitionStatus, CreditType, RegistrationStatus,
    TransactionType,
};
use crate::repository::competition::CompetitionRepository;
use crate::repository::credit::{CreditRepository, NewTransaction};
use crate::repository::registration::{RegistrationRepository, ScoreSubmission};
use crate::repository::result::{NewResult, ResultRepository};

/// Points per correct answer
pub const POINTS_PER_ANSWER: i32 = 10;

/// Validate a quiz attempt and turn it into a score
pub fn score_attempt(
    correct_answers: i32,
    total_questions: i32,
    time_taken_ms: i64,
) -> std::result::Result<ScoreSubmission, LedgerError> {
    if total_questions <= 0 {
        return Err(LedgerError::InvalidScore(
            "total_questions must be positive".to_string(),
        ));
    }
    if correct_answers < 0 || correct_answers > total_questions {
        return Err(LedgerError::InvalidScore(
            "correct_answers must be between 0 and total_questions".to_string(),
        ));
    }
    if time_taken_ms < 0 {
        return Err(LedgerError::InvalidScore(
            "time_taken_ms cannot be negative".to_string(),
        ));
    }

    Ok(ScoreSubmission {
        score: correct_answers * POINTS_PER_ANSWER,
        correct_answers,
        total_questions,
        time_taken_ms,
    })
}

/// One confirmed entry as seen by the ranking
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub user_id: Uuid,
    pub score: i32,
    pub time_taken_ms: Option<i64>,
    pub submitted: bool,
}

impl From<&CompetitionRegistration> for Entry {
    fn from(registration: &CompetitionRegistration) -> Self {
        Self {
            user_id: registration.user_id,
            score: registration.score.unwrap_or(0),
            time_taken_ms: registration.time_taken_ms,
            submitted: registration.has_submitted(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub entry: Entry,
    pub rank: i32,
}

fn ranking_key(entry: &Entry) -> (bool, i32, i64) {
    (
        entry.submitted,
        entry.score,
        entry.time_taken_ms.unwrap_or(i64::MAX),
    )
}

/// Order entries best first and assign standard competition ranks (1, 1, 3).
///
/// Higher score wins, then the faster time. Entries without a submission come
/// last. Equal keys share a rank.
pub fn rank_entries(mut entries: Vec<Entry>) -> Vec<RankedEntry> {
    entries.sort_by(|a, b| {
        let (a_sub, a_score, a_time) = ranking_key(a);
        let (b_sub, b_score, b_time) = ranking_key(b);
        b_sub
            .cmp(&a_sub)
            .then(b_score.cmp(&a_score))
            .then(a_time.cmp(&b_time))
            .then(a.user_id.cmp(&b.user_id))
    });

    let mut ranked: Vec<RankedEntry> = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev) if ranking_key(&prev.entry) == ranking_key(&entry) => prev.rank,
            _ => position as i32 + 1,
        };
        ranked.push(RankedEntry { entry, rank });
    }

    ranked
}

/// Split `pool` over ranked entries using the tier's place shares.
///
/// When fewer entrants submitted than there are paid places, the shares of
/// the occupied places are scaled up to cover the whole pool. Tied entrants
/// pool the shares of every place they occupy and split them evenly. Amounts
/// are rounded down to cents. Returns one prize per entry, in order.
pub fn distribute_prizes(ranked: &[RankedEntry], shares: &[u32], pool: Decimal) -> Vec<Decimal> {
    let mut prizes = vec![Decimal::ZERO; ranked.len()];

    let eligible = ranked.iter().take_while(|r| r.entry.submitted).count();
    let places = shares.len().min(eligible);
    if places == 0 || pool <= Decimal::ZERO {
        return prizes;
    }

    let share_total: u32 = shares[..places].iter().sum();
    let place_amount = |place: usize| -> Decimal {
        if place >= places {
            Decimal::ZERO
        } else {
            pool * Decimal::from(shares[place]) / Decimal::from(share_total)
        }
    };

    let mut start = 0;
    while start < eligible {
        let rank = ranked[start].rank;
        let end = ranked[start..eligible]
            .iter()
            .position(|r| r.rank != rank)
            .map(|offset| start + offset)
            .unwrap_or(eligible);

        let group_total: Decimal = (start..end).map(&place_amount).sum();
        if group_total > Decimal::ZERO {
            let each = (group_total / Decimal::from(end - start))
                .round_dp_with_strategy(2, RoundingStrategy::ToZero);
            for prize in &mut prizes[start..end] {
                *prize = each;
            }
        }

        start = end;
    }

    prizes
}

/// Build the result rows for a competition from its confirmed entries
pub fn compute_results(
    competition_name: &str,
    registrations: &[CompetitionRegistration],
) -> std::result::Result<Vec<NewResult>, LedgerError> {
    let tier = pricing::tier_for(competition_name)?;

    let collected: Decimal = registrations
        .iter()
        .filter(|r| r.status == RegistrationStatus::Confirmed)
        .map(|r| r.paid_amount)
        .sum();
    let pool = pricing::prize_pool(collected);

    let entries = registrations
        .iter()
        .filter(|r| r.status == RegistrationStatus::Confirmed)
        .map(Entry::from)
        .collect();
    let ranked = rank_entries(entries);
    let prizes = distribute_prizes(&ranked, tier.prize_shares, pool);

    Ok(ranked
        .into_iter()
        .zip(prizes)
        .map(|(ranked, prize)| NewResult {
            user_id: ranked.entry.user_id,
            rank: ranked.rank,
            score: ranked.entry.score,
            time_taken_ms: ranked.entry.time_taken_ms,
            prize,
            trophy: ranked.rank == 1 && ranked.entry.submitted,
        })
        .collect())
}

/// Record a quiz attempt for a live competition
pub async fn submit_score(
    pool: &PgPool,
    user_id: Uuid,
    competition_id: Uuid,
    correct_answers: i32,
    total_questions: i32,
    time_taken_ms: i64,
) -> Result<CompetitionRegistration> {
    let submission = score_attempt(correct_answers, total_questions, time_taken_ms)?;

    let mut tx = pool.begin().await?;

    let competition = CompetitionRepository::find_for_share(&mut tx, competition_id).await?;
    if competition.status != CompetitionStatus::Live {
        return Err(LedgerError::InvalidScore("competition is not live".to_string()).into());
    }

    let registration = RegistrationRepository::lock_for_user(&mut tx, user_id, competition_id)
        .await?
        .filter(|r| r.status == RegistrationStatus::Confirmed)
        .ok_or(LedgerError::NotRegistered)?;

    if registration.has_submitted() {
        return Err(LedgerError::ScoreAlreadySubmitted.into());
    }

    let updated =
        RegistrationRepository::record_score(&mut tx, registration.registration_id, &submission)
            .await?;

    tx.commit().await?;

    tracing::info!(
        %user_id,
        %competition_id,
        score = submission.score,
        time_taken_ms,
        "Score submitted"
    );

    Ok(updated)
}

/// Rank a finished competition, write its results and pay prizes into the
/// winners' winnings pools. Runs once per competition.
pub async fn settle_competition(
    pool: &PgPool,
    competition_id: Uuid,
) -> Result<Vec<CompetitionResult>> {
    let mut tx = pool.begin().await?;

    let competition = CompetitionRepository::lock(&mut tx, competition_id).await?;

    if competition.settled_at.is_some() {
        return Err(LedgerError::AlreadySettled.into());
    }
    if competition.status != CompetitionStatus::Finished {
        return Err(LedgerError::NotSettleable(format!(
            "status is {}",
            competition.status.as_str()
        ))
        .into());
    }

    let registrations = RegistrationRepository::lock_confirmed(&mut tx, competition_id).await?;
    let rows = compute_results(&competition.name, &registrations)?;

    let mut written = Vec::with_capacity(rows.len());
    for row in &rows {
        let result = ResultRepository::insert(&mut tx, competition_id, row)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    StorageError::Ledger(LedgerError::AlreadySettled)
                } else {
                    e
                }
            })?;

        if row.prize > Decimal::ZERO {
            CreditRepository::credit_pool(&mut tx, row.user_id, CreditType::Winnings, row.prize)
                .await?;
            CreditRepository::record(
                &mut tx,
                &NewTransaction {
                    user_id: row.user_id,
                    amount: row.prize,
                    credit_type: CreditType::Winnings,
                    transaction_type: TransactionType::Prize,
                    reference_id: Some(competition_id),
                    description: Some(format!("Rank {} in {}", row.rank, competition.name)),
                },
            )
            .await?;
        }

        written.push(result);
    }

    CompetitionRepository::mark_settled(&mut tx, competition_id).await?;
    tx.commit().await?;

    let paid: Decimal = rows.iter().map(|r| r.prize).sum();
    tracing::info!(
        %competition_id,
        entries = rows.len(),
        %paid,
        settled_at = %Utc::now(),
        "Competition settled"
    );

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: i32, time: i64) -> Entry {
        Entry {
            user_id: Uuid::new_v4(),
            score,
            time_taken_ms: Some(time),
            submitted: true,
        }
    }

    fn no_show() -> Entry {
        Entry {
            user_id: Uuid::new_v4(),
            score: 0,
            time_taken_ms: None,
            submitted: false,
        }
    }

    #[test]
    fn test_score_attempt_validation() {
        assert_eq!(score_attempt(7, 10, 1000).unwrap().score, 70);
        assert!(score_attempt(11, 10, 1000).is_err());
        assert!(score_attempt(0, 0, 1000).is_err());
        assert!(score_attempt(-1, 10, 1000).is_err());
        assert!(score_attempt(1, 10, -5).is_err());
    }

    #[test]
    fn test_rank_by_score_then_time() {
        let a = entry(80, 5000);
        let b = entry(90, 9000);
        let c = entry(80, 4000);
        let ranked = rank_entries(vec![a.clone(), b.clone(), c.clone()]);

        let order: Vec<_> = ranked.iter().map(|r| r.entry.user_id).collect();
        assert_eq!(order, vec![b.user_id, c.user_id, a.user_id]);
        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_share_rank() {
        let ranked = rank_entries(vec![
            entry(50, 1000),
            entry(90, 2000),
            entry(90, 2000),
            no_show(),
        ]);
        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3, 4]);
        assert!(!ranked[3].entry.submitted);
    }

    #[test]
    fn test_prizes_follow_shares() {
        let ranked = rank_entries(vec![entry(30, 1), entry(20, 1), entry(10, 1), entry(5, 1)]);
        let prizes = distribute_prizes(&ranked, &[50, 30, 20], Decimal::from(100));
        assert_eq!(
            prizes,
            vec![
                Decimal::from(50),
                Decimal::from(30),
                Decimal::from(20),
                Decimal::ZERO
            ]
        );
    }

    #[test]
    fn test_tied_winners_split_places() {
        let ranked = rank_entries(vec![entry(30, 1), entry(30, 1), entry(10, 1)]);
        let prizes = distribute_prizes(&ranked, &[50, 30, 20], Decimal::from(100));
        assert_eq!(
            prizes,
            vec![Decimal::from(40), Decimal::from(40), Decimal::from(20)]
        );
    }

    #[test]
    fn test_fewer_entrants_than_places_renormalises() {
        let ranked = rank_entries(vec![entry(30, 1), entry(10, 1)]);
        let prizes = distribute_prizes(&ranked, &[50, 30, 20], Decimal::from(80));
        assert_eq!(prizes, vec![Decimal::from(50), Decimal::from(30)]);
    }

    #[test]
    fn test_no_show_never_wins() {
        let ranked = rank_entries(vec![no_show(), no_show()]);
        let prizes = distribute_prizes(&ranked, &[100], Decimal::from(10));
        assert!(prizes.iter().all(|p| p.is_zero()));
    }

    #[test]
    fn test_prizes_never_exceed_pool() {
        let pool = Decimal::new(1000, 2);
        for n in 1..8 {
            let ranked = rank_entries((0..n).map(|_| entry(10, 10)).collect());
            let prizes = distribute_prizes(&ranked, &[40, 25, 15, 12, 8], pool);
            let total: Decimal = prizes.iter().sum();
            assert!(total <= pool, "{} tied entrants paid {}", n, total);
        }
    }

    #[test]
    fn test_compute_results_uses_confirmed_paid_amounts() {
        let now = Utc::now();
        let competition_id = Uuid::new_v4();
        let make = |score: Option<i32>, status: RegistrationStatus| CompetitionRegistration {
            registration_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            competition_id,
            paid_amount: if status == RegistrationStatus::Confirmed {
                Decimal::from(10)
            } else {
                Decimal::ZERO
            },
            payment_method: crate::models::PaymentMethod::Credits,
            payment_type: "entry_fee".to_string(),
            status,
            referral_used: Decimal::ZERO,
            winnings_used: Decimal::ZERO,
            purchased_used: Decimal::from(10),
            external_reference: None,
            score,
            correct_answers: score.map(|s| s / POINTS_PER_ANSWER),
            total_questions: score.map(|_| 10),
            time_taken_ms: score.map(|_| 60_000),
            submitted_at: score.map(|_| now),
            created_at: now,
            updated_at: now,
        };

        let registrations = vec![
            make(Some(90), RegistrationStatus::Confirmed),
            make(Some(70), RegistrationStatus::Confirmed),
            make(None, RegistrationStatus::Confirmed),
            make(None, RegistrationStatus::Cancelled),
        ];

        let results = compute_results("Premier League", &registrations).unwrap();
        assert_eq!(results.len(), 3);

        // 3 confirmed x 10 = 30 collected, 27 after rake, two places occupied (50/30 of 80)
        assert_eq!(results[0].prize, Decimal::new(1687, 2));
        assert_eq!(results[1].prize, Decimal::new(1012, 2));
        assert_eq!(results[2].prize, Decimal::ZERO);
        assert!(results[0].trophy);
        assert!(!results[1].trophy);
        assert_eq!(results[2].rank, 3);
    }
}
