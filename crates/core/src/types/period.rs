//! Calendar period (month + year) for monthly allocations.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Period`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodError {
    /// Month outside 1-12.
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(i32),
}

/// A calendar month in a specific year.
///
/// The allocation and distribution engines take an explicit `Period` rather
/// than reading the wall clock, so tests can inject fixed periods. HTTP
/// handlers derive the current period once at the boundary via
/// [`Period::current`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Calendar month, 1-12.
    pub month: i32,
    /// Calendar year.
    pub year: i32,
}

impl Period {
    /// Create a period, validating the month.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::InvalidMonth` when `month` is outside 1-12.
    pub const fn new(month: i32, year: i32) -> Result<Self, PeriodError> {
        if month < 1 || month > 12 {
            return Err(PeriodError::InvalidMonth(month));
        }
        Ok(Self { month, year })
    }

    /// The current UTC calendar period.
    #[must_use]
    pub fn current() -> Self {
        let now = Utc::now();
        Self {
            month: now.month().cast_signed(),
            year: now.year(),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_month() {
        assert_eq!(Period::new(0, 2025), Err(PeriodError::InvalidMonth(0)));
        assert_eq!(Period::new(13, 2025), Err(PeriodError::InvalidMonth(13)));
        assert!(Period::new(12, 2025).is_ok());
    }

    #[test]
    fn current_is_valid() {
        let period = Period::current();
        assert!((1..=12).contains(&period.month));
    }

    #[test]
    fn display_pads_month() {
        let period = Period::new(3, 2025).unwrap();
        assert_eq!(period.to_string(), "2025-03");
    }
}
