//! Queue token domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ration_tds_core::{ShopId, TokenId, TokenStatus, UserId};

/// A queue token: one cardholder's place in a shop's collection queue on
/// one date.
///
/// `queue_position` is 1-based and unique per (shop, date); the booking
/// service retries with a fresh ID when a unique index rejects an insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Generated token ID (e.g., `T17096...0001`).
    pub id: TokenId,
    /// Shop the token is for.
    pub shop_id: ShopId,
    /// Cardholder holding the token.
    pub user_id: UserId,
    /// Collection date.
    pub token_date: NaiveDate,
    /// Display slot, e.g. "10:15 AM".
    pub time_slot: String,
    /// 1-based position in that day's queue.
    pub queue_position: i32,
    /// Lifecycle status.
    pub status: TokenStatus,
    /// When the token was created.
    pub created_at: DateTime<Utc>,
}
