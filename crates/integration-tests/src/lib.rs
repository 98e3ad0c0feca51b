//! Integration test harness for Ration TDS.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! docker compose up -d postgres
//! cargo run -p ration-tds-cli -- migrate
//!
//! # Start the API
//! cargo run -p ration-tds-api
//!
//! # Run the ignored integration tests
//! cargo test -p ration-tds-integration-tests -- --ignored
//! ```
//!
//! Tests talk to a live server over HTTP and seed users directly through
//! the database, minting bearer tokens with the same `JWT_SECRET` the
//! server was started with.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::Utc;
use reqwest::Client;
use secrecy::SecretString;
use sqlx::PgPool;

use ration_tds_api::config::JwtConfig;
use ration_tds_api::models::user::User;
use ration_tds_api::services::jwt::JwtKeys;
use ration_tds_core::{CardType, Email, Role, ShopId, UserId};

/// A connected test environment: HTTP client, API base URL and a direct
/// database handle for seeding.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
    jwt: JwtKeys,
}

impl TestContext {
    /// Connect to the test environment.
    ///
    /// # Panics
    ///
    /// Panics if the database is unreachable or `JWT_SECRET` is unset;
    /// these tests only run against a prepared environment.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let base_url =
            std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let database_url = std::env::var("API_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("API_DATABASE_URL or DATABASE_URL must be set");

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        let jwt = JwtKeys::from_config(&JwtConfig {
            secret: SecretString::from(secret),
            expiry_hours: 1,
        });

        Self {
            client: Client::new(),
            base_url,
            pool,
            jwt,
        }
    }

    /// Seed a user directly, reusing the row if the email already exists.
    ///
    /// # Panics
    ///
    /// Panics on database errors.
    pub async fn seed_user(
        &self,
        email: &str,
        role: Role,
        shop_id: Option<&str>,
        card_type: Option<CardType>,
        family_size: Option<i32>,
    ) -> User {
        let row: (i32,) = sqlx::query_as(
            "INSERT INTO users (name, email, role, shop_id, card_type, family_size)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (email) DO UPDATE
                 SET role = EXCLUDED.role,
                     shop_id = EXCLUDED.shop_id,
                     card_type = EXCLUDED.card_type,
                     family_size = EXCLUDED.family_size,
                     is_active = TRUE
             RETURNING id",
        )
        .bind(email.split('@').next().unwrap_or("test"))
        .bind(email)
        .bind(role.to_string())
        .bind(shop_id)
        .bind(card_type.map(|c| c.to_string()))
        .bind(family_size)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to seed user");

        let now = Utc::now();
        User {
            id: UserId::new(row.0),
            name: email.split('@').next().unwrap_or("test").to_owned(),
            email: Email::parse(email).expect("seed email must be valid"),
            role,
            card_type,
            card_status: None,
            ration_card_number: None,
            family_size,
            shop_id: shop_id.map(ShopId::new),
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

    /// Mint a bearer token for a seeded user.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails.
    #[must_use]
    pub fn token_for(&self, user: &User) -> String {
        self.jwt.issue(user).expect("Failed to issue test token")
    }

    /// A fully-qualified API URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
