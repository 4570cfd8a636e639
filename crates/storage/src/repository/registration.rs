use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{CompetitionRegistration, PaymentMethod, RegistrationStatus};
use crate::services::ledger::Deduction;

#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub user_id: Uuid,
    pub competition_id: Uuid,
    pub paid_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: RegistrationStatus,
    pub deduction: Deduction,
}

/// Quiz result submitted for a registration
#[derive(Debug, Clone, Copy)]
pub struct ScoreSubmission {
    pub score: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub time_taken_ms: i64,
}

/// Repository for competition registrations
pub struct RegistrationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RegistrationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_for_user(
        &self,
        user_id: Uuid,
        competition_id: Uuid,
    ) -> Result<Option<CompetitionRegistration>> {
        let registration = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            SELECT registration_id, user_id, competition_id, paid_amount, payment_method,
                   payment_type, status, referral_used, winnings_used, purchased_used,
                   external_reference, score, correct_answers, total_questions, time_taken_ms,
                   submitted_at, created_at, updated_at
            FROM competition_registrations
            WHERE user_id = $1 AND competition_id = $2
            "#,
        )
        .bind(user_id)
        .bind(competition_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(registration)
    }

    /// All registrations of a competition, optionally filtered by status
    pub async fn list_for_competition(
        &self,
        competition_id: Uuid,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<CompetitionRegistration>> {
        let registrations = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            SELECT registration_id, user_id, competition_id, paid_amount, payment_method,
                   payment_type, status, referral_used, winnings_used, purchased_used,
                   external_reference, score, correct_answers, total_questions, time_taken_ms,
                   submitted_at, created_at, updated_at
            FROM competition_registrations
            WHERE competition_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(competition_id)
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(registrations)
    }

    /// Pending registrations created before `older_than_minutes` ago
    pub async fn list_stale_pending(
        &self,
        older_than_minutes: i64,
    ) -> Result<Vec<CompetitionRegistration>> {
        let registrations = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            SELECT registration_id, user_id, competition_id, paid_amount, payment_method,
                   payment_type, status, referral_used, winnings_used, purchased_used,
                   external_reference, score, correct_answers, total_questions, time_taken_ms,
                   submitted_at, created_at, updated_at
            FROM competition_registrations
            WHERE status = 'pending'
              AND updated_at < NOW() - make_interval(mins => $1::int)
            ORDER BY updated_at ASC
            "#,
        )
        .bind(older_than_minutes)
        .fetch_all(self.pool)
        .await?;

        Ok(registrations)
    }

    pub async fn lock_for_user(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        competition_id: Uuid,
    ) -> Result<Option<CompetitionRegistration>> {
        let registration = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            SELECT registration_id, user_id, competition_id, paid_amount, payment_method,
                   payment_type, status, referral_used, winnings_used, purchased_used,
                   external_reference, score, correct_answers, total_questions, time_taken_ms,
                   submitted_at, created_at, updated_at
            FROM competition_registrations
            WHERE user_id = $1 AND competition_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(competition_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(registration)
    }

    /// Read inside a transaction without taking a row lock
    pub async fn find_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        registration_id: Uuid,
    ) -> Result<CompetitionRegistration> {
        let registration = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            SELECT registration_id, user_id, competition_id, paid_amount, payment_method,
                   payment_type, status, referral_used, winnings_used, purchased_used,
                   external_reference, score, correct_answers, total_questions, time_taken_ms,
                   submitted_at, created_at, updated_at
            FROM competition_registrations
            WHERE registration_id = $1
            "#,
        )
        .bind(registration_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(registration)
    }

    pub async fn lock_by_id(
        tx: &mut Transaction<'_, Postgres>,
        registration_id: Uuid,
    ) -> Result<CompetitionRegistration> {
        let registration = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            SELECT registration_id, user_id, competition_id, paid_amount, payment_method,
                   payment_type, status, referral_used, winnings_used, purchased_used,
                   external_reference, score, correct_answers, total_questions, time_taken_ms,
                   submitted_at, created_at, updated_at
            FROM competition_registrations
            WHERE registration_id = $1
            FOR UPDATE
            "#,
        )
        .bind(registration_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(registration)
    }

    /// Confirmed registrations of a competition, locked for settlement
    pub async fn lock_confirmed(
        tx: &mut Transaction<'_, Postgres>,
        competition_id: Uuid,
    ) -> Result<Vec<CompetitionRegistration>> {
        let registrations = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            SELECT registration_id, user_id, competition_id, paid_amount, payment_method,
                   payment_type, status, referral_used, winnings_used, purchased_used,
                   external_reference, score, correct_answers, total_questions, time_taken_ms,
                   submitted_at, created_at, updated_at
            FROM competition_registrations
            WHERE competition_id = $1 AND status = 'confirmed'
            ORDER BY created_at ASC
            FOR UPDATE
            "#,
        )
        .bind(competition_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(registrations)
    }

    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewRegistration,
    ) -> Result<CompetitionRegistration> {
        let registration = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            INSERT INTO competition_registrations (
                user_id, competition_id, paid_amount, payment_method, payment_type, status,
                referral_used, winnings_used, purchased_used
            )
            VALUES ($1, $2, $3, $4, 'entry_fee', $5, $6, $7, $8)
            RETURNING registration_id, user_id, competition_id, paid_amount, payment_method,
                      payment_type, status, referral_used, winnings_used, purchased_used,
                      external_reference, score, correct_answers, total_questions, time_taken_ms,
                      submitted_at, created_at, updated_at
            "#,
        )
        .bind(new.user_id)
        .bind(new.competition_id)
        .bind(new.paid_amount)
        .bind(new.payment_method)
        .bind(new.status)
        .bind(new.deduction.referral)
        .bind(new.deduction.winnings)
        .bind(new.deduction.purchased)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                return StorageError::ConstraintViolation(
                    "Already registered for this competition".to_string(),
                );
            }
            err
        })?;

        Ok(registration)
    }

    /// Move a registration to a new payment state and record its deduction
    pub async fn update_payment(
        tx: &mut Transaction<'_, Postgres>,
        registration_id: Uuid,
        status: RegistrationStatus,
        payment_method: PaymentMethod,
        paid_amount: Decimal,
        deduction: &Deduction,
    ) -> Result<CompetitionRegistration> {
        let registration = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            UPDATE competition_registrations
            SET status = $2,
                external_reference = CASE
                    WHEN payment_method = $3 THEN external_reference
                    ELSE NULL
                END,
                payment_method = $3,
                paid_amount = $4,
                referral_used = $5,
                winnings_used = $6,
                purchased_used = $7,
                updated_at = NOW()
            WHERE registration_id = $1
            RETURNING registration_id, user_id, competition_id, paid_amount, payment_method,
                      payment_type, status, referral_used, winnings_used, purchased_used,
                      external_reference, score, correct_answers, total_questions, time_taken_ms,
                      submitted_at, created_at, updated_at
            "#,
        )
        .bind(registration_id)
        .bind(status)
        .bind(payment_method)
        .bind(paid_amount)
        .bind(deduction.referral)
        .bind(deduction.winnings)
        .bind(deduction.purchased)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(registration)
    }

    /// Remember the provider reference (checkout session, order id) of a pending entry
    pub async fn set_external_reference(
        &self,
        registration_id: Uuid,
        reference: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE competition_registrations
            SET external_reference = $2, updated_at = NOW()
            WHERE registration_id = $1
            "#,
        )
        .bind(registration_id)
        .bind(reference)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    pub async fn confirm_external(
        tx: &mut Transaction<'_, Postgres>,
        registration_id: Uuid,
        paid_amount: Decimal,
        reference: &str,
    ) -> Result<CompetitionRegistration> {
        let registration = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            UPDATE competition_registrations
            SET status = 'confirmed',
                paid_amount = $2,
                external_reference = $3,
                updated_at = NOW()
            WHERE registration_id = $1
            RETURNING registration_id, user_id, competition_id, paid_amount, payment_method,
                      payment_type, status, referral_used, winnings_used, purchased_used,
                      external_reference, score, correct_answers, total_questions, time_taken_ms,
                      submitted_at, created_at, updated_at
            "#,
        )
        .bind(registration_id)
        .bind(paid_amount)
        .bind(reference)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(registration)
    }

    pub async fn record_score(
        tx: &mut Transaction<'_, Postgres>,
        registration_id: Uuid,
        submission: &ScoreSubmission,
    ) -> Result<CompetitionRegistration> {
        let registration = sqlx::query_as::<_, CompetitionRegistration>(
            r#"
            UPDATE competition_registrations
            SET score = $2,
                correct_answers = $3,
                total_questions = $4,
                time_taken_ms = $5,
                submitted_at = NOW(),
                updated_at = NOW()
            WHERE registration_id = $1 AND submitted_at IS NULL
            RETURNING registration_id, user_id, competition_id, paid_amount, payment_method,
                      payment_type, status, referral_used, winnings_used, purchased_used,
                      external_reference, score, correct_answers, total_questions, time_taken_ms,
                      submitted_at, created_at, updated_at
            "#,
        )
        .bind(registration_id)
        .bind(submission.score)
        .bind(submission.correct_answers)
        .bind(submission.total_questions)
        .bind(submission.time_taken_ms)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(registration)
    }
}
