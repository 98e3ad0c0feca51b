//! Fair-price shop domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ration_tds_core::ShopId;

/// A fair-price shop distributing rations to its assigned cardholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    /// Shop code (e.g., `SHOP001`).
    pub id: ShopId,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: Option<String>,
    /// Administrative district.
    pub district: Option<String>,
    /// Contact email or phone.
    pub contact: Option<String>,
    /// Working hours, free text (e.g., "9 AM - 5 PM").
    pub hours: Option<String>,
    /// When the shop was registered.
    pub created_at: DateTime<Utc>,
}
