//! Database operations for the ration `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `shops` - Fair-price shops
//! - `users` - Cardholders, shopkeepers and admins (one table, role column)
//! - `verification_codes` - Hashed sign-in codes
//! - `monthly_allocations` - Per-user, per-item, per-period entitlement rows
//! - `quota_change_log` - Before/after quantity snapshots for every distribution
//! - `stock_items` - Per-shop inventory levels
//! - `stock_audit_log` - Best-effort stock change trail
//! - `tokens` - Queue positions for collection visits
//! - `notifications` - Shop-scoped and global announcements
//! - `complaints` - Cardholder grievances
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p ration-tds-cli -- migrate
//! ```

pub mod allocations;
pub mod complaints;
pub mod notifications;
pub mod shops;
pub mod stock;
pub mod tokens;
pub mod users;
pub mod verification_codes;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use allocations::AllocationRepository;
pub use complaints::ComplaintRepository;
pub use notifications::NotificationRepository;
pub use shops::ShopRepository;
pub use stock::StockRepository;
pub use tokens::TokenRepository;
pub use users::UserRepository;
pub use verification_codes::VerificationCodeRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Constraint violation (e.g., duplicate queue position).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
