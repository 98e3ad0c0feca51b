//! Fair-price shop repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ration_tds_core::ShopId;

use super::RepositoryError;
use crate::models::shop::Shop;

#[derive(sqlx::FromRow)]
struct ShopRow {
    id: ShopId,
    name: String,
    address: Option<String>,
    district: Option<String>,
    contact: Option<String>,
    hours: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            district: row.district,
            contact: row.contact,
            hours: row.hours,
            created_at: row.created_at,
        }
    }
}

const SHOP_COLUMNS: &str = "id, name, address, district, contact, hours, created_at";

/// Fields for registering a shop.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub id: ShopId,
    pub name: String,
    pub address: Option<String>,
    pub district: Option<String>,
    pub contact: Option<String>,
    pub hours: Option<String>,
}

/// Repository for shop operations.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    /// Create a new shop repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All shops, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Shop>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, ShopRow>(&format!("SELECT {SHOP_COLUMNS} FROM shops ORDER BY id"))
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a shop by its code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &ShopId) -> Result<Option<Shop>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Register a new shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the shop code already exists.
    pub async fn create(&self, new: &NewShop) -> Result<Shop, RepositoryError> {
        let id = &new.id;
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "INSERT INTO shops (id, name, address, district, contact, hours)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {SHOP_COLUMNS}"
        ))
        .bind(id)
        .bind(&new.name)
        .bind(new.address.as_deref())
        .bind(new.district.as_deref())
        .bind(new.contact.as_deref())
        .bind(new.hours.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("shop {id} already exists"));
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }
}
