//! Ration TDS API library.
//!
//! This crate provides the HTTP API as a library so it can be tested and
//! reused by the CLI and integration tests.
//!
//! The API serves three audiences behind one JWT-authenticated surface:
//! cardholders (allocations, tokens, notifications, complaints), shopkeepers
//! (distribution, stock, token queues, broadcasts) and admins (users, shops,
//! eligibility overrides, stock corrections).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
