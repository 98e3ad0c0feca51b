//! Shop stock repository: level queries, clamped mutations and a
//! best-effort audit trail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use ration_tds_core::{ItemCode, ShopId, StockAuditId, StockChangeType, StockItemId, UserId};

use super::RepositoryError;
use crate::models::stock::{StockAuditEntry, StockItem};

#[derive(sqlx::FromRow)]
struct StockRow {
    id: StockItemId,
    shop_id: ShopId,
    item_code: ItemCode,
    name: String,
    unit: String,
    quantity: Decimal,
    government_allocated: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<StockRow> for StockItem {
    fn from(row: StockRow) -> Self {
        Self {
            id: row.id,
            shop_id: row.shop_id,
            item_code: row.item_code,
            name: row.name,
            unit: row.unit,
            quantity: row.quantity,
            government_allocated: row.government_allocated,
            updated_at: row.updated_at,
        }
    }
}

const STOCK_COLUMNS: &str =
    "id, shop_id, item_code, name, unit, quantity, government_allocated, updated_at";

/// Repository for shop stock operations.
pub struct StockRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StockRepository<'a> {
    /// Create a new stock repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current stock levels at a shop, ordered by item code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_shop(&self, shop_id: &ShopId) -> Result<Vec<StockItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items
             WHERE shop_id = $1
             ORDER BY item_code"
        ))
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Apply a signed delta to one item's quantity, clamping the result at
    /// zero, then log the change.
    ///
    /// The audit insert is best-effort: a logging failure must never undo a
    /// stock mutation that already happened, so it is warned and swallowed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop carries no such item.
    pub async fn apply_delta(
        &self,
        shop_id: &ShopId,
        item_code: &ItemCode,
        delta: Decimal,
        changed_by: UserId,
        change_type: StockChangeType,
    ) -> Result<StockItem, RepositoryError> {
        let row = sqlx::query_as::<_, StockRow>(&format!(
            "UPDATE stock_items
             SET quantity = GREATEST(quantity + $3, 0), updated_at = NOW()
             WHERE shop_id = $1 AND item_code = $2
             RETURNING {STOCK_COLUMNS}"
        ))
        .bind(shop_id)
        .bind(item_code)
        .bind(delta)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::NotFound(format!("stock item {item_code} at shop {shop_id}"))
        })?;

        self.record_audit(shop_id, item_code, change_type, delta, row.quantity, changed_by)
            .await;

        Ok(row.into())
    }

    /// Set one item's quantity to an absolute value (admin correction),
    /// then log the change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop carries no such item.
    pub async fn set_quantity(
        &self,
        shop_id: &ShopId,
        item_code: &ItemCode,
        quantity: Decimal,
        changed_by: UserId,
    ) -> Result<StockItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous: Decimal = sqlx::query_scalar(
            "SELECT quantity FROM stock_items
             WHERE shop_id = $1 AND item_code = $2
             FOR UPDATE",
        )
        .bind(shop_id)
        .bind(item_code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            RepositoryError::NotFound(format!("stock item {item_code} at shop {shop_id}"))
        })?;

        let row = sqlx::query_as::<_, StockRow>(&format!(
            "UPDATE stock_items
             SET quantity = GREATEST($3, 0), updated_at = NOW()
             WHERE shop_id = $1 AND item_code = $2
             RETURNING {STOCK_COLUMNS}"
        ))
        .bind(shop_id)
        .bind(item_code)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let delta = row.quantity - previous;
        self.record_audit(
            shop_id,
            item_code,
            StockChangeType::AdminCorrection,
            delta,
            row.quantity,
            changed_by,
        )
        .await;

        Ok(row.into())
    }

    /// Record a government allocation: create the stock row if the shop has
    /// never carried the item, otherwise add to the on-hand quantity and
    /// reset the allocated baseline.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn allocate(
        &self,
        shop_id: &ShopId,
        item_code: &ItemCode,
        name: &str,
        unit: &str,
        quantity: Decimal,
        changed_by: UserId,
    ) -> Result<StockItem, RepositoryError> {
        let row = sqlx::query_as::<_, StockRow>(&format!(
            "INSERT INTO stock_items (shop_id, item_code, name, unit, quantity, government_allocated)
             VALUES ($1, $2, $3, $4, $5, $5)
             ON CONFLICT (shop_id, item_code)
             DO UPDATE SET quantity = stock_items.quantity + EXCLUDED.quantity,
                           government_allocated = EXCLUDED.government_allocated,
                           updated_at = NOW()
             RETURNING {STOCK_COLUMNS}"
        ))
        .bind(shop_id)
        .bind(item_code)
        .bind(name)
        .bind(unit)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;

        self.record_audit(
            shop_id,
            item_code,
            StockChangeType::GovernmentAllocation,
            quantity,
            row.quantity,
            changed_by,
        )
        .await;

        Ok(row.into())
    }

    /// Recent audit entries for a shop, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored change type
    /// fails to parse.
    pub async fn audit_log(
        &self,
        shop_id: &ShopId,
        limit: i64,
    ) -> Result<Vec<StockAuditEntry>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct AuditRow {
            id: StockAuditId,
            shop_id: ShopId,
            item_code: ItemCode,
            change_type: String,
            delta: Decimal,
            resulting_quantity: Decimal,
            changed_by: UserId,
            created_at: DateTime<Utc>,
        }

        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT id, shop_id, item_code, change_type, delta,
                    resulting_quantity, changed_by, created_at
             FROM stock_audit_log
             WHERE shop_id = $1
             ORDER BY id DESC
             LIMIT $2",
        )
        .bind(shop_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let change_type = r
                    .change_type
                    .parse::<StockChangeType>()
                    .map_err(RepositoryError::DataCorruption)?;
                Ok(StockAuditEntry {
                    id: r.id,
                    shop_id: r.shop_id,
                    item_code: r.item_code,
                    change_type,
                    delta: r.delta,
                    resulting_quantity: r.resulting_quantity,
                    changed_by: r.changed_by,
                    created_at: r.created_at,
                })
            })
            .collect()
    }

    /// Append to the audit trail, swallowing failures.
    async fn record_audit(
        &self,
        shop_id: &ShopId,
        item_code: &ItemCode,
        change_type: StockChangeType,
        delta: Decimal,
        resulting_quantity: Decimal,
        changed_by: UserId,
    ) {
        let result = sqlx::query(
            "INSERT INTO stock_audit_log
                 (shop_id, item_code, change_type, delta, resulting_quantity, changed_by)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(shop_id)
        .bind(item_code)
        .bind(change_type.to_string())
        .bind(delta)
        .bind(resulting_quantity)
        .bind(changed_by)
        .execute(self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                error = %e,
                shop_id = %shop_id,
                item_code = %item_code,
                "failed to record stock audit entry"
            );
        }
    }
}
