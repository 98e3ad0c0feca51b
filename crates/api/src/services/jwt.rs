//! Bearer token issuing and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ration_tds_core::{Role, ShopId, UserId};

use crate::config::JwtConfig;
use crate::models::user::User;

/// Errors from token handling.
#[derive(Debug, Error)]
pub enum JwtError {
    /// The token is malformed, expired or signed with a different key.
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Claims carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: i32,
    /// Sign-in email.
    pub email: String,
    /// Access role at issue time.
    pub role: Role,
    /// Shop the user belonged to at issue time.
    pub shop_id: Option<String>,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    /// The user ID as a typed value.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }

    /// The shop ID as a typed value, if the token carries one.
    #[must_use]
    pub fn shop(&self) -> Option<ShopId> {
        self.shop_id.as_deref().map(ShopId::new)
    }
}

/// HS256 signing keys, derived once from configuration.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_hours: i64,
}

impl JwtKeys {
    /// Derive keys from the JWT configuration.
    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiry_hours: config.expiry_hours,
        }
    }

    /// Issue a bearer token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.as_i32(),
            email: user.email.as_str().to_owned(),
            role: user.role,
            shop_id: user.shop_id.as_ref().map(|s| s.as_str().to_owned()),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify a bearer token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Invalid` for malformed, expired or foreign tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use ration_tds_core::Email;
    use secrecy::SecretString;

    use super::*;

    fn test_keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: SecretString::from("kqX3mZ8pW1vT6yB4nR7jD2gF5hL9sC0a"),
            expiry_hours: 24,
        })
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(42),
            name: "Asha".to_owned(),
            email: Email::parse("asha@example.com").unwrap(),
            role: Role::Cardholder,
            card_type: None,
            card_status: None,
            ration_card_number: None,
            family_size: Some(4),
            shop_id: Some(ShopId::new("SHOP001")),
            mobile: None,
            address: None,
            district: None,
            pincode: None,
            is_active: true,
            is_flagged: false,
            language: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let keys = test_keys();
        let token = keys.issue(&test_user()).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "asha@example.com");
        assert_eq!(claims.role, Role::Cardholder);
        assert_eq!(claims.shop(), Some(ShopId::new("SHOP001")));
        assert_eq!(claims.user_id(), UserId::new(42));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let keys = test_keys();
        let other = JwtKeys::from_config(&JwtConfig {
            secret: SecretString::from("z9Y8xW7vU6tS5rQ4pO3nM2lK1jH0gF9e"),
            expiry_hours: 24,
        });

        let token = other.issue(&test_user()).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(test_keys().verify("not-a-token").is_err());
    }
}
