//! Shop stock domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ration_tds_core::{ItemCode, ShopId, StockAuditId, StockChangeType, StockItemId, UserId};

/// Current on-hand stock of one item at one shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    /// Unique stock row ID.
    pub id: StockItemId,
    /// Shop holding the stock.
    pub shop_id: ShopId,
    /// Stock item.
    pub item_code: ItemCode,
    /// Display name (e.g., "Rice").
    pub name: String,
    /// Unit of measure (e.g., "kg").
    pub unit: String,
    /// Current on-hand quantity, clamped to >= 0.
    pub quantity: Decimal,
    /// Baseline quantity from the last government allocation.
    pub government_allocated: Decimal,
    /// When stock last changed.
    pub updated_at: DateTime<Utc>,
}

/// One append-only entry in the stock change trail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAuditEntry {
    /// Unique audit row ID.
    pub id: StockAuditId,
    /// Shop whose stock changed.
    pub shop_id: ShopId,
    /// Stock item.
    pub item_code: ItemCode,
    /// What kind of change this was.
    pub change_type: StockChangeType,
    /// Signed change in quantity.
    pub delta: Decimal,
    /// Quantity after the change was applied.
    pub resulting_quantity: Decimal,
    /// User who made the change.
    pub changed_by: UserId,
    /// When the change happened.
    pub created_at: DateTime<Utc>,
}
