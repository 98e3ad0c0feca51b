//! Passwordless authentication: emailed sign-in codes redeemed for bearer
//! tokens.
//!
//! Request flow: generate a 6-digit code, store only its argon2 hash, mail
//! the code. Verify flow: compare the submitted code against the address's
//! recent unverified hashes; on match, mark the code redeemed, find or
//! create the user, and issue a JWT.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::Rng;
use thiserror::Error;

use ration_tds_core::Email;

use crate::db::{RepositoryError, UserRepository, VerificationCodeRepository};
use crate::error::AppError;
use crate::models::user::User;
use crate::services::email::EmailError;
use crate::services::jwt::JwtError;
use crate::state::AppState;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] ration_tds_core::EmailError),

    /// The submitted code matched none of the outstanding codes.
    #[error("invalid or expired code")]
    InvalidCode,

    /// The account is deactivated.
    #[error("account is deactivated")]
    AccountInactive,

    /// Code hashing error.
    #[error("code hashing error")]
    CodeHash,

    /// Code delivery failed.
    #[error("email delivery error: {0}")]
    Delivery(#[from] EmailError),

    /// Token issuing failed.
    #[error("token error: {0}")]
    Token(#[from] JwtError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidEmail(inner) => Self::Validation(inner.to_string()),
            AuthError::InvalidCode => Self::Unauthorized("invalid or expired code".to_owned()),
            AuthError::AccountInactive => Self::Forbidden("account is deactivated".to_owned()),
            AuthError::CodeHash | AuthError::Token(_) => Self::Internal(e.to_string()),
            AuthError::Delivery(inner) => Self::Email(inner),
            AuthError::Repository(inner) => Self::Database(inner),
        }
    }
}

/// A successful sign-in: the user and their fresh bearer token.
#[derive(Debug)]
pub struct SignIn {
    pub user: User,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    /// Create an authentication service over the shared state.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Issue a sign-in code to an email address.
    ///
    /// Deliberately does not reveal whether the address belongs to an
    /// existing user; unknown addresses become cardholders at verify time.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if storing or delivering the code fails.
    pub async fn request_code(&self, email: &Email) -> Result<(), AuthError> {
        let code = generate_code();
        let code_hash = hash_code(&code)?;
        let expires_at =
            Utc::now() + Duration::minutes(self.state.config().code_expiry_minutes);

        VerificationCodeRepository::new(self.state.pool())
            .insert(email, &code_hash, expires_at)
            .await?;

        self.state.email().send_sign_in_code(email, &code).await?;

        tracing::info!(email = %email, "sign-in code issued");
        Ok(())
    }

    /// Redeem a sign-in code for a bearer token.
    ///
    /// First-time addresses get a cardholder account on the default shop,
    /// named after the email's local part.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCode` when the code matches none of the
    /// address's outstanding codes, `AuthError::AccountInactive` for
    /// deactivated users.
    pub async fn verify_code(
        &self,
        email: &Email,
        code: &str,
        language: Option<&str>,
    ) -> Result<SignIn, AuthError> {
        let codes = VerificationCodeRepository::new(self.state.pool());

        let candidates = codes.recent_unverified(email).await?;
        let mut matched = None;
        for candidate in &candidates {
            if verify_code_hash(code, &candidate.code_hash) {
                matched = Some(candidate.id);
                break;
            }
        }

        let Some(code_id) = matched else {
            // Count the failure against the newest outstanding code.
            if let Some(newest) = candidates.first() {
                codes.increment_attempts(newest.id).await?;
            }
            return Err(AuthError::InvalidCode);
        };

        codes.mark_verified(code_id).await?;

        let users = UserRepository::new(self.state.pool());
        let user = match users.get_by_email(email).await? {
            Some(user) => user,
            None => {
                users
                    .create_cardholder(
                        email,
                        email.local_part(),
                        &self.state.config().default_shop_id,
                    )
                    .await?
            }
        };

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        users.record_login(user.id, language).await?;
        let token = self.state.jwt().issue(&user)?;

        tracing::info!(user_id = %user.id, role = %user.role, "user signed in");
        Ok(SignIn { user, token })
    }
}

/// Generate a 6-digit sign-in code.
fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(100_000..=999_999);
    n.to_string()
}

/// Hash a sign-in code using Argon2id.
fn hash_code(code: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(code.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::CodeHash)
}

/// Verify a sign-in code against a stored hash.
fn verify_code_hash(code: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(code.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn code_hash_round_trip() {
        let hash = hash_code("483920").expect("hashing succeeds");
        assert!(verify_code_hash("483920", &hash));
        assert!(!verify_code_hash("000000", &hash));
    }

    #[test]
    fn corrupt_hash_never_verifies() {
        assert!(!verify_code_hash("483920", "not-a-phc-string"));
    }
}
