//! Core types for Ration TDS.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod period;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use period::{Period, PeriodError};
pub use status::*;
