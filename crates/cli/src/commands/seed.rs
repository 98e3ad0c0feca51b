//! Seed shops and stock items from a YAML file.
//!
//! The file is a list of shops, each with optional stock lines:
//!
//! ```yaml
//! - id: SHOP001
//!   name: Fair Price Shop 1
//!   address: 12 Market Road
//!   stock:
//!     - item_code: rice
//!       name: Rice
//!       unit: kg
//!       quantity: 500
//! ```
//!
//! Seeding is idempotent: existing shops and stock lines are left as-is.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use super::database_url;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File could not be read.
    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),
}

#[derive(Debug, Deserialize)]
struct ShopSeed {
    id: String,
    name: String,
    address: Option<String>,
    #[serde(default)]
    stock: Vec<StockSeed>,
}

#[derive(Debug, Deserialize)]
struct StockSeed {
    item_code: String,
    name: String,
    #[serde(default = "default_unit")]
    unit: String,
    #[serde(default)]
    quantity: Decimal,
}

fn default_unit() -> String {
    "kg".to_owned()
}

/// Seed shops and their stock items from a YAML file.
///
/// # Errors
///
/// Returns an error if the file is missing or malformed, or a database
/// operation fails.
pub async fn shops(file_path: &str) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = database_url().ok_or(SeedError::MissingEnvVar("API_DATABASE_URL"))?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading shop seed data");
    let content = tokio::fs::read_to_string(path).await?;
    let shops: Vec<ShopSeed> = serde_yaml::from_str(&content)?;
    info!(shops = shops.len(), "Parsed seed file");

    let pool = PgPool::connect(&database_url).await?;

    for shop in &shops {
        sqlx::query(
            "INSERT INTO shops (id, name, address)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&shop.id)
        .bind(&shop.name)
        .bind(shop.address.as_deref())
        .execute(&pool)
        .await?;

        for item in &shop.stock {
            sqlx::query(
                "INSERT INTO stock_items (shop_id, item_code, name, unit, quantity)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (shop_id, item_code) DO NOTHING",
            )
            .bind(&shop.id)
            .bind(&item.item_code)
            .bind(&item.name)
            .bind(&item.unit)
            .bind(item.quantity)
            .execute(&pool)
            .await?;
        }

        info!(shop = %shop.id, stock = shop.stock.len(), "Seeded shop");
    }

    info!("Seeding complete!");
    Ok(())
}
