//! Sign-in code repository.
//!
//! Codes are stored as argon2 hashes keyed by email (the user may not exist
//! yet at request time). Verification walks the recent unverified codes for
//! the address and compares against each hash.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ration_tds_core::{Email, VerificationCodeId};

use super::RepositoryError;

/// How many outstanding codes per address the verifier considers.
const RECENT_CODES_LIMIT: i64 = 5;

/// A stored sign-in code candidate.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredCode {
    /// Row ID.
    pub id: VerificationCodeId,
    /// Argon2 hash of the 6-digit code.
    pub code_hash: String,
    /// When the code stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// Failed comparison attempts against this code.
    pub attempts: i32,
}

/// Repository for sign-in code operations.
pub struct VerificationCodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VerificationCodeRepository<'a> {
    /// Create a new verification code repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a freshly issued code hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        email: &Email,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationCodeId, RepositoryError> {
        let id: VerificationCodeId = sqlx::query_scalar(
            "INSERT INTO verification_codes (email, code_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(email.as_str())
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// The most recent unverified, unexpired codes for an address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_unverified(
        &self,
        email: &Email,
    ) -> Result<Vec<StoredCode>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoredCode>(
            "SELECT id, code_hash, expires_at, attempts
             FROM verification_codes
             WHERE email = $1 AND NOT verified AND expires_at > NOW()
             ORDER BY id DESC
             LIMIT $2",
        )
        .bind(email.as_str())
        .bind(RECENT_CODES_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Mark a code redeemed so it cannot be replayed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_verified(&self, id: VerificationCodeId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE verification_codes SET verified = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Count a failed comparison against a stored code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn increment_attempts(&self, id: VerificationCodeId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE verification_codes SET attempts = attempts + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
