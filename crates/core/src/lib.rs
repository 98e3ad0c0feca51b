//! Ration TDS Core - Shared domain types and entitlement policy.
//!
//! This crate provides the types used across all Ration TDS components:
//! - `api` - REST backend for cardholders, shopkeepers and admins
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, periods, and statuses
//! - [`entitlement`] - The monthly entitlement policy per ration-card category

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entitlement;
pub mod types;

pub use types::*;
