//! User domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ration_tds_core::{CardType, Email, Role, ShopId, UserId};

/// A registered user: cardholder, shopkeeper or admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Sign-in email address.
    pub email: Email,
    /// Access role.
    pub role: Role,
    /// Ration-card category (cardholders only).
    pub card_type: Option<CardType>,
    /// Card lifecycle state as printed on the card (e.g., "active").
    pub card_status: Option<String>,
    /// Government-issued ration card number.
    pub ration_card_number: Option<String>,
    /// Household size used by the entitlement policy.
    pub family_size: Option<i32>,
    /// Fair-price shop the user belongs to.
    pub shop_id: Option<ShopId>,
    /// Contact mobile number.
    pub mobile: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Administrative district.
    pub district: Option<String>,
    /// Postal code.
    pub pincode: Option<String>,
    /// Inactive users cannot sign in or receive broadcast tokens.
    pub is_active: bool,
    /// Flagged users are under admin review.
    pub is_flagged: bool,
    /// Preferred UI language code.
    pub language: Option<String>,
    /// Last successful sign-in.
    pub last_login: Option<DateTime<Utc>>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user record last changed.
    pub updated_at: DateTime<Utc>,
}

/// Aggregate user counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Total registered users.
    pub total_users: i64,
    /// Cardholders only.
    pub total_cardholders: i64,
    /// Shopkeepers only.
    pub total_shopkeepers: i64,
    /// Users currently flagged for review.
    pub flagged_users: i64,
    /// Users marked inactive.
    pub inactive_users: i64,
}

/// Fields an admin can change on a user profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub card_type: Option<CardType>,
    pub card_status: Option<String>,
    pub ration_card_number: Option<String>,
    pub family_size: Option<i32>,
    pub shop_id: Option<ShopId>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
    pub is_active: Option<bool>,
}
