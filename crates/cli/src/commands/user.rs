//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin
//! ration-cli user create -e admin@example.com -n "Admin Name" -r admin
//!
//! # Create a shopkeeper (shop required)
//! ration-cli user create -e keeper@example.com -n "Shop Keeper" -r shopkeeper -s SHOP001
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use ration_tds_core::Role;
use sqlx::PgPool;
use thiserror::Error;

use super::database_url;

/// Errors that can occur during user creation.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, shopkeeper, cardholder")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Shopkeepers need a shop assignment.
    #[error("Role {0} requires --shop")]
    MissingShop(Role),

    /// Named shop does not exist.
    #[error("Shop not found: {0}")]
    ShopNotFound(String),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),
}

/// Create a new user. Returns the new user's ID.
///
/// # Errors
///
/// Returns an error if the inputs are invalid, the shop does not exist,
/// or the email is already registered.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    shop: Option<&str>,
) -> Result<i32, UserError> {
    dotenvy::dotenv().ok();

    let role: Role = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;

    // Basic email validation
    if !email.contains('@') || !email.contains('.') {
        return Err(UserError::InvalidEmail(email.to_owned()));
    }

    if role == Role::Shopkeeper && shop.is_none() {
        return Err(UserError::MissingShop(role));
    }

    let database_url = database_url().ok_or(UserError::MissingEnvVar("API_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    if let Some(shop_id) = shop {
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM shops WHERE id = $1")
            .bind(shop_id)
            .fetch_optional(&pool)
            .await?;
        if exists.is_none() {
            return Err(UserError::ShopNotFound(shop_id.to_owned()));
        }
    }

    tracing::info!("Creating user: {} ({})", email, role);

    let row: (i32,) = sqlx::query_as(
        "INSERT INTO users (name, email, role, shop_id)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(role.to_string())
    .bind(shop)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return UserError::UserExists(email.to_owned());
        }
        UserError::Database(e)
    })?;

    Ok(row.0)
}
