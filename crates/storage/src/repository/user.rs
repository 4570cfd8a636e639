use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{User, UserRole};

/// Repository for users mirrored from the hosted auth service
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, role, referral_code, referred_by, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(user)
    }

    /// Insert the user on first sight, refreshing the email otherwise
    pub async fn upsert(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        referral_code: &str,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, email, role, referral_code)
            VALUES ($1, $2, 'user', $3)
            ON CONFLICT (user_id)
            DO UPDATE SET email = COALESCE(EXCLUDED.email, users.email)
            RETURNING user_id, email, role, referral_code, referred_by, created_at
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(referral_code)
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }

    pub async fn set_role(&self, user_id: Uuid, role: UserRole) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2
            WHERE user_id = $1
            RETURNING user_id, email, role, referral_code, referred_by, created_at
            "#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(user)
    }

    pub async fn find_by_referral_code(
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, role, referral_code, referred_by, created_at
            FROM users
            WHERE referral_code = $1
            "#,
        )
        .bind(code.trim().to_uppercase())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(user)
    }

    pub async fn lock(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, role, referral_code, referred_by, created_at
            FROM users
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(user)
    }

    pub async fn set_referred_by(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        referrer_id: Uuid,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET referred_by = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(referrer_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
