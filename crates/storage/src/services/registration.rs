//! Competition entry: deciding what a registration request should do, and
//! carrying it out inside a single database transaction.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::ledger::{self, CreditPools, Deduction, LedgerError};
use super::pricing;
use crate::error::{Result, StorageError};
use crate::models::{
    Competition, CompetitionRegistration, CompetitionStatus, CreditType, PaymentMethod,
    RegistrationStatus, TransactionType,
};
use crate::repository::competition::CompetitionRepository;
use crate::repository::credit::{CreditRepository, NewTransaction};
use crate::repository::registration::{NewRegistration, RegistrationRepository};

/// Registrations close this many seconds before kickoff
pub const LATE_REGISTRATION_CUTOFF_SECS: i64 = 300;

/// Everything needed to decide a registration request
#[derive(Debug, Clone)]
pub struct RegistrationContext<'a> {
    pub competition: &'a Competition,
    pub existing: Option<&'a CompetitionRegistration>,
    pub pools: CreditPools,
    pub payment_method: PaymentMethod,
    /// Amount the client claims to have paid; only used for logging
    pub client_amount: Option<Decimal>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationPlan {
    /// The stored record already matches the request: hand it back untouched
    ReturnExisting,
    Insert {
        status: RegistrationStatus,
        cost: Decimal,
        deduction: Deduction,
    },
    Update {
        registration_id: Uuid,
        status: RegistrationStatus,
        cost: Decimal,
        deduction: Deduction,
    },
}

/// True once the competition is inside its late-registration window
pub fn registration_closed(competition: &Competition, now: DateTime<Utc>) -> bool {
    now >= competition.start_time - Duration::seconds(LATE_REGISTRATION_CUTOFF_SECS)
}

/// A confirmed entry satisfies any confirmed request; a pending one only the
/// provider it is waiting on.
fn matches_request(
    existing: &CompetitionRegistration,
    status: RegistrationStatus,
    payment_method: PaymentMethod,
) -> bool {
    existing.status == status
        && (status == RegistrationStatus::Confirmed || existing.payment_method == payment_method)
}

/// Decide what a registration request does, without touching storage
pub fn plan_registration(
    ctx: &RegistrationContext<'_>,
) -> std::result::Result<RegistrationPlan, LedgerError> {
    let competition = ctx.competition;

    if competition.status != CompetitionStatus::Scheduled {
        return Err(LedgerError::RegistrationClosed);
    }

    if registration_closed(competition, ctx.now) {
        return Err(LedgerError::RegistrationClosed);
    }

    let cost = pricing::entry_fee_for(&competition.name)?;

    if let Some(claimed) = ctx.client_amount
        && claimed != cost
    {
        tracing::warn!(
            competition_id = %competition.competition_id,
            %claimed,
            %cost,
            "Client-submitted amount differs from tier price, using tier price"
        );
    }

    let status = ctx.payment_method.target_status();

    let existing_id = match ctx.existing {
        Some(existing) if matches_request(existing, status, ctx.payment_method) => {
            return Ok(RegistrationPlan::ReturnExisting);
        }
        Some(existing) if existing.status == RegistrationStatus::Confirmed => {
            return Err(LedgerError::AlreadyRegistered);
        }
        Some(existing) => Some(existing.registration_id),
        None => None,
    };

    let deduction = if status == RegistrationStatus::Confirmed {
        ledger::allocate(&ctx.pools, cost)?
    } else {
        Deduction::default()
    };

    Ok(match existing_id {
        Some(registration_id) => RegistrationPlan::Update {
            registration_id,
            status,
            cost,
            deduction,
        },
        None => RegistrationPlan::Insert {
            status,
            cost,
            deduction,
        },
    })
}

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub registration: CompetitionRegistration,
    pub competition: Competition,
    /// A new registration row was written
    pub created: bool,
    /// An existing row moved to a new status or payment method
    pub updated: bool,
}

/// Register a user for a competition.
///
/// The balance row and the registration row are locked, the plan is computed
/// against the locked values, and the pool update, registration write and
/// audit rows commit together.
pub async fn register_for_competition(
    pool: &PgPool,
    user_id: Uuid,
    competition_id: Uuid,
    payment_method: PaymentMethod,
    client_amount: Option<Decimal>,
) -> Result<RegistrationOutcome> {
    let mut tx = pool.begin().await?;

    let competition = CompetitionRepository::find_for_share(&mut tx, competition_id).await?;

    CreditRepository::ensure_balance(&mut tx, user_id).await?;
    let balance = CreditRepository::lock_balance(&mut tx, user_id).await?;
    let existing = RegistrationRepository::lock_for_user(&mut tx, user_id, competition_id).await?;

    let ctx = RegistrationContext {
        competition: &competition,
        existing: existing.as_ref(),
        pools: balance.pools(),
        payment_method,
        client_amount,
        now: Utc::now(),
    };

    let plan = plan_registration(&ctx)?;

    let (registration, created) = match plan {
        RegistrationPlan::ReturnExisting => {
            tx.rollback().await?;
            let registration = existing.ok_or(StorageError::NotFound)?;
            tracing::debug!(
                registration_id = %registration.registration_id,
                "Registration already in requested state"
            );
            return Ok(RegistrationOutcome {
                registration,
                competition,
                created: false,
                updated: false,
            });
        }
        RegistrationPlan::Insert {
            status,
            cost,
            deduction,
        } => {
            let new = NewRegistration {
                user_id,
                competition_id,
                paid_amount: paid_amount_for(status, cost),
                payment_method,
                status,
                deduction,
            };
            (RegistrationRepository::insert(&mut tx, &new).await?, true)
        }
        RegistrationPlan::Update {
            registration_id,
            status,
            cost,
            deduction,
        } => {
            let registration = RegistrationRepository::update_payment(
                &mut tx,
                registration_id,
                status,
                payment_method,
                paid_amount_for(status, cost),
                &deduction,
            )
            .await?;
            (registration, false)
        }
    };

    let deduction = registration.deduction();
    if !deduction.is_empty() {
        CreditRepository::apply_deduction(&mut tx, user_id, &deduction).await?;
        for (credit_type, amount) in deduction.parts() {
            CreditRepository::record(
                &mut tx,
                &NewTransaction {
                    user_id,
                    amount: -amount,
                    credit_type,
                    transaction_type: TransactionType::EntryFee,
                    reference_id: Some(registration.registration_id),
                    description: Some(format!("Entry fee for {}", competition.name)),
                },
            )
            .await?;
        }
    }

    tx.commit().await?;

    tracing::info!(
        %user_id,
        %competition_id,
        registration_id = %registration.registration_id,
        status = ?registration.status,
        "Competition registration written"
    );

    Ok(RegistrationOutcome {
        registration,
        competition,
        created,
        updated: !created,
    })
}

fn paid_amount_for(status: RegistrationStatus, cost: Decimal) -> Decimal {
    if status == RegistrationStatus::Confirmed {
        cost
    } else {
        Decimal::ZERO
    }
}

/// Cancel a confirmed entry before the cutoff and give the credits back to
/// the pools they came from.
pub async fn cancel_registration(
    pool: &PgPool,
    user_id: Uuid,
    competition_id: Uuid,
) -> Result<CompetitionRegistration> {
    let mut tx = pool.begin().await?;

    let competition = CompetitionRepository::find_for_share(&mut tx, competition_id).await?;
    if competition.status != CompetitionStatus::Scheduled
        || registration_closed(&competition, Utc::now())
    {
        return Err(LedgerError::RegistrationClosed.into());
    }

    CreditRepository::ensure_balance(&mut tx, user_id).await?;
    CreditRepository::lock_balance(&mut tx, user_id).await?;

    let registration = RegistrationRepository::lock_for_user(&mut tx, user_id, competition_id)
        .await?
        .ok_or(LedgerError::NotRegistered)?;

    match registration.status {
        RegistrationStatus::Cancelled => {
            tx.rollback().await?;
            return Ok(registration);
        }
        RegistrationStatus::Confirmed if registration.payment_method != PaymentMethod::Credits => {
            // card payments are refunded through the provider, not the ledger
            return Err(LedgerError::InvalidStatusTransition {
                from: "confirmed".to_string(),
                to: "cancelled".to_string(),
            }
            .into());
        }
        _ => {}
    }

    let deduction = registration.deduction();
    CreditRepository::apply_refund(&mut tx, user_id, &deduction).await?;

    for (credit_type, amount) in deduction.parts() {
        CreditRepository::record(
            &mut tx,
            &NewTransaction {
                user_id,
                amount,
                credit_type,
                transaction_type: TransactionType::Refund,
                reference_id: Some(registration.registration_id),
                description: Some(format!("Refund for {}", competition.name)),
            },
        )
        .await?;
    }

    let cancelled = RegistrationRepository::update_payment(
        &mut tx,
        registration.registration_id,
        RegistrationStatus::Cancelled,
        registration.payment_method,
        Decimal::ZERO,
        &Deduction::default(),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        %user_id,
        %competition_id,
        refunded = %deduction.total(),
        "Registration cancelled"
    );

    Ok(cancelled)
}

/// What a provider-confirmed entry payment should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalPaymentPlan {
    /// Pending entry, competition still open: confirm it
    Confirm,
    /// This payment already confirmed the entry
    AlreadyApplied,
    /// The entry can no longer take this payment; keep the money as credits
    CreditPurchased,
}

pub fn plan_external_payment(
    registration: &CompetitionRegistration,
    competition: &Competition,
    reference: &str,
    now: DateTime<Utc>,
) -> ExternalPaymentPlan {
    match registration.status {
        RegistrationStatus::Confirmed
            if registration.external_reference.as_deref() == Some(reference) =>
        {
            ExternalPaymentPlan::AlreadyApplied
        }
        RegistrationStatus::Pending
            if competition.status == CompetitionStatus::Scheduled
                && !registration_closed(competition, now) =>
        {
            ExternalPaymentPlan::Confirm
        }
        _ => ExternalPaymentPlan::CreditPurchased,
    }
}

#[derive(Debug, Clone)]
pub enum ExternalPaymentOutcome {
    Confirmed(CompetitionRegistration),
    AlreadyApplied(CompetitionRegistration),
    /// The entry fee went to the purchased pool instead
    Credited {
        registration: CompetitionRegistration,
        amount: Decimal,
    },
}

/// Apply a provider-confirmed entry payment.
///
/// Only a pending entry of a competition that is still open is confirmed.
/// Any other payment for the entry is credited to the payer's purchased pool.
pub async fn confirm_external_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    registration_id: Uuid,
    reference: &str,
) -> Result<ExternalPaymentOutcome> {
    let snapshot = RegistrationRepository::find_in_tx(tx, registration_id).await?;
    if snapshot.user_id != user_id {
        return Err(StorageError::NotFound);
    }

    let competition = CompetitionRepository::find_for_share(tx, snapshot.competition_id).await?;
    let cost = pricing::entry_fee_for(&competition.name)?;

    CreditRepository::ensure_balance(tx, user_id).await?;
    CreditRepository::lock_balance(tx, user_id).await?;
    let registration = RegistrationRepository::lock_by_id(tx, registration_id).await?;

    match plan_external_payment(&registration, &competition, reference, Utc::now()) {
        ExternalPaymentPlan::Confirm => {
            let confirmed =
                RegistrationRepository::confirm_external(tx, registration_id, cost, reference).await?;

            tracing::info!(
                %registration_id,
                reference,
                "Pending registration confirmed by payment provider"
            );

            Ok(ExternalPaymentOutcome::Confirmed(confirmed))
        }
        ExternalPaymentPlan::AlreadyApplied => {
            tracing::debug!(%registration_id, reference, "Entry payment already applied");
            Ok(ExternalPaymentOutcome::AlreadyApplied(registration))
        }
        ExternalPaymentPlan::CreditPurchased => {
            CreditRepository::credit_pool(tx, user_id, CreditType::Purchased, cost).await?;
            CreditRepository::record(
                tx,
                &NewTransaction {
                    user_id,
                    amount: cost,
                    credit_type: CreditType::Purchased,
                    transaction_type: TransactionType::Purchase,
                    reference_id: Some(registration_id),
                    description: Some(format!(
                        "Entry payment {} for {} kept as credits",
                        reference, competition.name
                    )),
                },
            )
            .await?;

            tracing::warn!(
                %user_id,
                %registration_id,
                reference,
                registration_status = ?registration.status,
                competition_status = ?competition.status,
                credited = %cost,
                "Entry payment arrived for an entry that cannot take it, credited to purchased pool"
            );

            Ok(ExternalPaymentOutcome::Credited {
                registration,
                amount: cost,
            })
        }
    }
}

/// Mark a pending entry as cancelled after its checkout expired
pub async fn expire_pending(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    registration_id: Uuid,
) -> Result<Option<CompetitionRegistration>> {
    let registration = RegistrationRepository::lock_by_id(tx, registration_id).await?;

    if registration.status != RegistrationStatus::Pending {
        return Ok(None);
    }

    let cancelled = RegistrationRepository::update_payment(
        tx,
        registration_id,
        RegistrationStatus::Cancelled,
        registration.payment_method,
        Decimal::ZERO,
        &Deduction::default(),
    )
    .await?;

    Ok(Some(cancelled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competition(name: &str, starts_in: Duration) -> Competition {
        let now = Utc::now();
        Competition {
            competition_id: Uuid::new_v4(),
            name: name.to_string(),
            start_time: now + starts_in,
            entry_fee: Decimal::from(999),
            status: CompetitionStatus::Scheduled,
            settled_at: None,
            created_at: now,
        }
    }

    fn registration(
        competition: &Competition,
        status: RegistrationStatus,
        method: PaymentMethod,
    ) -> CompetitionRegistration {
        let now = Utc::now();
        CompetitionRegistration {
            registration_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            competition_id: competition.competition_id,
            paid_amount: Decimal::ZERO,
            payment_method: method,
            payment_type: "entry_fee".to_string(),
            status,
            referral_used: Decimal::ZERO,
            winnings_used: Decimal::ZERO,
            purchased_used: Decimal::ZERO,
            external_reference: None,
            score: None,
            correct_answers: None,
            total_questions: None,
            time_taken_ms: None,
            submitted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn rich() -> CreditPools {
        CreditPools {
            referral: Decimal::from(2),
            winnings: Decimal::from(3),
            purchased: Decimal::from(100),
        }
    }

    fn ctx<'a>(
        competition: &'a Competition,
        existing: Option<&'a CompetitionRegistration>,
        pools: CreditPools,
        payment_method: PaymentMethod,
    ) -> RegistrationContext<'a> {
        RegistrationContext {
            competition,
            existing,
            pools,
            payment_method,
            client_amount: None,
            now: Utc::now(),
        }
    }

    #[test]
    fn test_new_credit_registration_deducts_tier_price() {
        let comp = competition("Premier League", Duration::hours(1));
        let plan = plan_registration(&ctx(&comp, None, rich(), PaymentMethod::Credits)).unwrap();

        assert_eq!(
            plan,
            RegistrationPlan::Insert {
                status: RegistrationStatus::Confirmed,
                cost: Decimal::from(10),
                deduction: Deduction {
                    referral: Decimal::from(2),
                    winnings: Decimal::from(3),
                    purchased: Decimal::from(5),
                },
            }
        );
    }

    #[test]
    fn test_client_amount_is_ignored() {
        let comp = competition("Championship", Duration::hours(1));
        let mut request = ctx(&comp, None, rich(), PaymentMethod::Credits);
        request.client_amount = Some(Decimal::new(1, 2));

        match plan_registration(&request).unwrap() {
            RegistrationPlan::Insert { cost, deduction, .. } => {
                assert_eq!(cost, Decimal::from(5));
                assert_eq!(deduction.total(), Decimal::from(5));
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_stored_entry_fee_is_not_used() {
        // stored fee is 999, tier price is 1
        let comp = competition("Sunday League", Duration::hours(1));
        match plan_registration(&ctx(&comp, None, rich(), PaymentMethod::Credits)).unwrap() {
            RegistrationPlan::Insert { cost, .. } => assert_eq!(cost, Decimal::ONE),
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_same_status_returns_existing() {
        let comp = competition("Premier League", Duration::hours(1));
        let existing = registration(&comp, RegistrationStatus::Confirmed, PaymentMethod::Credits);

        let plan =
            plan_registration(&ctx(&comp, Some(&existing), rich(), PaymentMethod::Credits)).unwrap();
        assert_eq!(plan, RegistrationPlan::ReturnExisting);

        let pending = registration(&comp, RegistrationStatus::Pending, PaymentMethod::Stripe);
        let plan =
            plan_registration(&ctx(&comp, Some(&pending), rich(), PaymentMethod::Stripe)).unwrap();
        assert_eq!(plan, RegistrationPlan::ReturnExisting);
    }

    #[test]
    fn test_same_status_returns_existing_without_credits() {
        let comp = competition("Premier League", Duration::hours(1));
        let existing = registration(&comp, RegistrationStatus::Confirmed, PaymentMethod::Credits);

        let plan = plan_registration(&ctx(
            &comp,
            Some(&existing),
            CreditPools::default(),
            PaymentMethod::Credits,
        ))
        .unwrap();
        assert_eq!(plan, RegistrationPlan::ReturnExisting);
    }

    #[test]
    fn test_pending_switches_provider() {
        let comp = competition("Championship", Duration::hours(1));
        let pending = registration(&comp, RegistrationStatus::Pending, PaymentMethod::Stripe);

        let plan = plan_registration(&ctx(
            &comp,
            Some(&pending),
            CreditPools::default(),
            PaymentMethod::Paypal,
        ))
        .unwrap();
        assert_eq!(
            plan,
            RegistrationPlan::Update {
                registration_id: pending.registration_id,
                status: RegistrationStatus::Pending,
                cost: Decimal::from(5),
                deduction: Deduction::default(),
            }
        );
    }

    #[test]
    fn test_confirmed_card_entry_satisfies_credit_request() {
        let comp = competition("Championship", Duration::hours(1));
        let confirmed = registration(&comp, RegistrationStatus::Confirmed, PaymentMethod::Stripe);

        let plan =
            plan_registration(&ctx(&comp, Some(&confirmed), rich(), PaymentMethod::Credits)).unwrap();
        assert_eq!(plan, RegistrationPlan::ReturnExisting);
    }

    #[test]
    fn test_pending_upgraded_with_credits() {
        let comp = competition("Championship", Duration::hours(1));
        let pending = registration(&comp, RegistrationStatus::Pending, PaymentMethod::Stripe);

        let plan =
            plan_registration(&ctx(&comp, Some(&pending), rich(), PaymentMethod::Credits)).unwrap();
        match plan {
            RegistrationPlan::Update {
                registration_id,
                status,
                deduction,
                ..
            } => {
                assert_eq!(registration_id, pending.registration_id);
                assert_eq!(status, RegistrationStatus::Confirmed);
                assert_eq!(deduction.total(), Decimal::from(5));
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_confirmed_cannot_go_back_to_pending() {
        let comp = competition("Championship", Duration::hours(1));
        let confirmed = registration(&comp, RegistrationStatus::Confirmed, PaymentMethod::Credits);

        let err = plan_registration(&ctx(&comp, Some(&confirmed), rich(), PaymentMethod::Paypal))
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyRegistered);
    }

    #[test]
    fn test_external_payment_does_not_deduct() {
        let comp = competition("Champions League", Duration::hours(1));
        let plan =
            plan_registration(&ctx(&comp, None, CreditPools::default(), PaymentMethod::Stripe))
                .unwrap();
        assert_eq!(
            plan,
            RegistrationPlan::Insert {
                status: RegistrationStatus::Pending,
                cost: Decimal::from(25),
                deduction: Deduction::default(),
            }
        );
    }

    #[test]
    fn test_insufficient_credits() {
        let comp = competition("Champions League", Duration::hours(1));
        let err = plan_registration(&ctx(&comp, None, rich(), PaymentMethod::Credits)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientCredits { .. }));
    }

    #[test]
    fn test_late_registration_rejected_even_with_credits() {
        for secs in [0, 1, 120, 299, 300] {
            let comp = competition("Sunday League", Duration::seconds(secs));
            let err = plan_registration(&ctx(&comp, None, rich(), PaymentMethod::Credits))
                .unwrap_err();
            assert_eq!(err, LedgerError::RegistrationClosed, "{} seconds before start", secs);
        }

        let comp = competition("Sunday League", Duration::seconds(301));
        assert!(plan_registration(&ctx(&comp, None, rich(), PaymentMethod::Credits)).is_ok());
    }

    #[test]
    fn test_cutoff_checked_before_credits() {
        let comp = competition("Champions League", Duration::seconds(10));
        let err = plan_registration(&ctx(&comp, None, CreditPools::default(), PaymentMethod::Credits))
            .unwrap_err();
        assert_eq!(err, LedgerError::RegistrationClosed);
    }

    #[test]
    fn test_live_competition_is_closed() {
        let mut comp = competition("Sunday League", Duration::hours(2));
        comp.status = CompetitionStatus::Live;
        let err = plan_registration(&ctx(&comp, None, rich(), PaymentMethod::Credits)).unwrap_err();
        assert_eq!(err, LedgerError::RegistrationClosed);
    }

    #[test]
    fn test_unknown_tier() {
        let comp = competition("Five-a-side", Duration::hours(2));
        let err = plan_registration(&ctx(&comp, None, rich(), PaymentMethod::Credits)).unwrap_err();
        assert_eq!(err, LedgerError::UnknownTier("Five-a-side".to_string()));
    }

    #[test]
    fn test_external_payment_confirms_open_pending_entry() {
        let comp = competition("Premier League", Duration::hours(1));
        let pending = registration(&comp, RegistrationStatus::Pending, PaymentMethod::Stripe);

        assert_eq!(
            plan_external_payment(&pending, &comp, "cs_1", Utc::now()),
            ExternalPaymentPlan::Confirm
        );
    }

    #[test]
    fn test_external_payment_for_cancelled_entry_is_credited() {
        let comp = competition("Premier League", Duration::hours(1));
        let cancelled = registration(&comp, RegistrationStatus::Cancelled, PaymentMethod::Stripe);

        assert_eq!(
            plan_external_payment(&cancelled, &comp, "cs_1", Utc::now()),
            ExternalPaymentPlan::CreditPurchased
        );
    }

    #[test]
    fn test_external_payment_after_close_is_credited() {
        let mut comp = competition("Premier League", Duration::hours(1));
        let pending = registration(&comp, RegistrationStatus::Pending, PaymentMethod::Paypal);

        comp.status = CompetitionStatus::Live;
        assert_eq!(
            plan_external_payment(&pending, &comp, "ORDER-1", Utc::now()),
            ExternalPaymentPlan::CreditPurchased
        );

        comp.status = CompetitionStatus::Finished;
        assert_eq!(
            plan_external_payment(&pending, &comp, "ORDER-1", Utc::now()),
            ExternalPaymentPlan::CreditPurchased
        );

        let late = competition("Premier League", Duration::seconds(120));
        assert_eq!(
            plan_external_payment(&pending, &late, "ORDER-1", Utc::now()),
            ExternalPaymentPlan::CreditPurchased
        );
    }

    #[test]
    fn test_second_payment_for_confirmed_entry_is_credited() {
        let comp = competition("Premier League", Duration::hours(1));

        let by_credits = registration(&comp, RegistrationStatus::Confirmed, PaymentMethod::Credits);
        assert_eq!(
            plan_external_payment(&by_credits, &comp, "cs_2", Utc::now()),
            ExternalPaymentPlan::CreditPurchased
        );

        let mut by_card = registration(&comp, RegistrationStatus::Confirmed, PaymentMethod::Stripe);
        by_card.external_reference = Some("cs_1".to_string());
        assert_eq!(
            plan_external_payment(&by_card, &comp, "cs_2", Utc::now()),
            ExternalPaymentPlan::CreditPurchased
        );
        assert_eq!(
            plan_external_payment(&by_card, &comp, "cs_1", Utc::now()),
            ExternalPaymentPlan::AlreadyApplied
        );
    }
}
