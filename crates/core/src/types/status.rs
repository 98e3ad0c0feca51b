//! Closed enums for roles, card categories and entity statuses.
//!
//! The statutory ration-card categories and user roles are modelled as
//! exhaustive enums rather than free strings, so adding a category is a
//! compile-time-checked change across the entitlement policy and the access
//! checks.

use serde::{Deserialize, Serialize};

/// Statutory ration-card category.
///
/// Each category carries a distinct monthly entitlement formula (see
/// [`crate::entitlement`]). `PHH` and `BPL` are deliberately distinct
/// branches: Priority Household splits 60/40 with a sugar line, Below
/// Poverty Line splits 70/30 without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum CardType {
    /// Antyodaya Anna Yojana - flat ration regardless of family size.
    AAY,
    /// Priority Household - 5 kg per member, 60/40 rice/wheat plus sugar.
    PHH,
    /// Below Poverty Line - 5 kg per member, 70/30 rice/wheat, no sugar.
    BPL,
    /// Above Poverty Line - 3 kg per member at subsidised market rate.
    APL,
}

impl CardType {
    /// All card categories, in display order.
    pub const ALL: [Self; 4] = [Self::AAY, Self::PHH, Self::BPL, Self::APL];
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AAY => write!(f, "AAY"),
            Self::PHH => write!(f, "PHH"),
            Self::BPL => write!(f, "BPL"),
            Self::APL => write!(f, "APL"),
        }
    }
}

impl std::str::FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AAY" => Ok(Self::AAY),
            "PHH" => Ok(Self::PHH),
            "BPL" => Ok(Self::BPL),
            "APL" => Ok(Self::APL),
            _ => Err(format!("invalid card type: {s}")),
        }
    }
}

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Holds a ration card; collects entitlements at one shop.
    Cardholder,
    /// Runs a fair-price shop; records distributions for its cardholders.
    Shopkeeper,
    /// District administrator; full access.
    Admin,
}

impl Role {
    /// Whether this role may act on other users' quotas (staff roles).
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Shopkeeper | Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cardholder => write!(f, "cardholder"),
            Self::Shopkeeper => write!(f, "shopkeeper"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cardholder" => Ok(Self::Cardholder),
            "shopkeeper" => Ok(Self::Shopkeeper),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Lifecycle status of a queue token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Created by broadcast, not yet confirmed by the holder.
    Pending,
    /// Booked and waiting to be served.
    #[default]
    Active,
    /// The holder was served.
    Completed,
    /// Withdrawn by the holder or the shop.
    Cancelled,
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for TokenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid token status: {s}")),
        }
    }
}

/// Lifecycle status of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            _ => Err(format!("invalid complaint status: {s}")),
        }
    }
}

/// Kind of change recorded in the stock audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockChangeType {
    /// Day-to-day correction by the shopkeeper.
    ShopkeeperUpdate,
    /// Absolute correction by an admin.
    AdminCorrection,
    /// Government baseline allocation to the shop.
    GovernmentAllocation,
}

impl std::fmt::Display for StockChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShopkeeperUpdate => write!(f, "shopkeeper_update"),
            Self::AdminCorrection => write!(f, "admin_correction"),
            Self::GovernmentAllocation => write!(f, "government_allocation"),
        }
    }
}

impl std::str::FromStr for StockChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shopkeeper_update" => Ok(Self::ShopkeeperUpdate),
            "admin_correction" => Ok(Self::AdminCorrection),
            "government_allocation" => Ok(Self::GovernmentAllocation),
            _ => Err(format!("invalid stock change type: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn card_type_roundtrip() {
        for ct in CardType::ALL {
            assert_eq!(ct.to_string().parse::<CardType>().unwrap(), ct);
        }
        assert!("VIP".parse::<CardType>().is_err());
    }

    #[test]
    fn card_type_serde_uses_bare_names() {
        assert_eq!(serde_json::to_string(&CardType::AAY).unwrap(), "\"AAY\"");
        let ct: CardType = serde_json::from_str("\"BPL\"").unwrap();
        assert_eq!(ct, CardType::BPL);
    }

    #[test]
    fn role_staff_check() {
        assert!(!Role::Cardholder.is_staff());
        assert!(Role::Shopkeeper.is_staff());
        assert!(Role::Admin.is_staff());
    }

    #[test]
    fn role_roundtrip() {
        for role in [Role::Cardholder, Role::Shopkeeper, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn token_status_roundtrip() {
        for status in [
            TokenStatus::Pending,
            TokenStatus::Active,
            TokenStatus::Completed,
            TokenStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<TokenStatus>().unwrap(), status);
        }
    }

    #[test]
    fn stock_change_type_roundtrip() {
        for kind in [
            StockChangeType::ShopkeeperUpdate,
            StockChangeType::AdminCorrection,
            StockChangeType::GovernmentAllocation,
        ] {
            assert_eq!(
                kind.to_string().parse::<StockChangeType>().unwrap(),
                kind
            );
        }
    }
}
