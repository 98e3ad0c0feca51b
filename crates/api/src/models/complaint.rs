//! Complaint domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ration_tds_core::{ComplaintId, ComplaintStatus, ShopId, UserId};

/// A grievance filed by a cardholder against their shop or the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    /// Unique complaint ID.
    pub id: ComplaintId,
    /// User who filed the complaint.
    pub user_id: UserId,
    /// Shop the complaint concerns, if any.
    pub shop_id: Option<ShopId>,
    /// Short subject line.
    pub subject: String,
    /// Full description.
    pub description: String,
    /// Lifecycle status.
    pub status: ComplaintStatus,
    /// When the complaint was filed.
    pub created_at: DateTime<Utc>,
    /// When the complaint last changed.
    pub updated_at: DateTime<Utc>,
}
