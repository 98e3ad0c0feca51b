//! Monthly allocation domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ration_tds_core::{AllocationId, ItemCode, UserId};

/// One user's entitlement for one item in one calendar month.
///
/// `collected_quantity` never exceeds `eligible_quantity`; the distribution
/// engine enforces the cap inside its transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAllocation {
    /// Unique allocation ID.
    pub id: AllocationId,
    /// Cardholder this row belongs to.
    pub user_id: UserId,
    /// Stock item.
    pub item_code: ItemCode,
    /// Calendar month, 1-12.
    pub month: i32,
    /// Calendar year.
    pub year: i32,
    /// Policy-derived or admin-set entitlement in kilograms.
    pub eligible_quantity: Decimal,
    /// Amount collected so far this month.
    pub collected_quantity: Decimal,
    /// Timestamp of the most recent distribution, if any.
    pub collection_date: Option<DateTime<Utc>>,
    /// User who last changed the collected amount.
    pub last_modified_by: Option<UserId>,
    /// Free-text reason supplied with the last change.
    pub modification_reason: Option<String>,
    /// When the row was lazily created.
    pub created_at: DateTime<Utc>,
    /// When the row last changed.
    pub updated_at: DateTime<Utc>,
}

/// One quota change with before/after snapshots, joined with the acting
/// user's name, for the recent-changes feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationHistoryEntry {
    /// Allocation row the change applied to.
    pub allocation_id: AllocationId,
    /// Cardholder whose quota changed.
    pub user_id: UserId,
    /// Stock item.
    pub item_code: ItemCode,
    /// Calendar month of the changed allocation, 1-12.
    pub month: i32,
    /// Calendar year of the changed allocation.
    pub year: i32,
    /// Collected quantity before the change.
    pub old_quantity: Decimal,
    /// Collected quantity after the change.
    pub new_quantity: Decimal,
    /// Signed change in kilograms (positive = collected more).
    pub change_amount: Decimal,
    /// User who made the change.
    pub changed_by: UserId,
    /// Display name of the acting user.
    pub changed_by_name: String,
    /// Free-text reason supplied with the change.
    pub reason: Option<String>,
    /// When the change happened.
    pub created_at: DateTime<Utc>,
}

/// Allocations for one calendar month, grouped for the six-month history view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyHistoryGroup {
    /// Calendar month, 1-12.
    pub month: i32,
    /// Calendar year.
    pub year: i32,
    /// Allocation rows for that month, ordered by item code.
    pub allocations: Vec<MonthlyAllocation>,
}
