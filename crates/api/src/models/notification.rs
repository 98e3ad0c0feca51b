//! Notification domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ration_tds_core::{NotificationId, ShopId, UserId};

/// An announcement delivered to users.
///
/// Scoping: `shop_id = None` means global (visible to everyone);
/// `user_id = None` means shop-wide within that shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification ID.
    pub id: NotificationId,
    /// Shop scope, or `None` for global.
    pub shop_id: Option<ShopId>,
    /// Addressed user, or `None` for shop-wide.
    pub user_id: Option<UserId>,
    /// Category tag (e.g., "token", "stock", "general").
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Human-readable message.
    pub message: String,
    /// Whether external delivery succeeded.
    pub is_sent: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the addressed user acknowledged it, if they have.
    pub acknowledged_at: Option<DateTime<Utc>>,
}
