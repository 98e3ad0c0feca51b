//! Domain models serialized to and from the JSON API.
//!
//! JSON field names are camelCase to match the mobile clients; database
//! column names stay snake_case and are mapped in the repositories.

pub mod allocation;
pub mod complaint;
pub mod notification;
pub mod shop;
pub mod stock;
pub mod token;
pub mod user;

pub use allocation::{AllocationHistoryEntry, MonthlyAllocation, MonthlyHistoryGroup};
pub use complaint::Complaint;
pub use notification::Notification;
pub use shop::Shop;
pub use stock::{StockAuditEntry, StockItem};
pub use token::Token;
pub use user::{User, UserStats};
