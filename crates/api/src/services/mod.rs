//! Business services that sit between routes and repositories.

pub mod auth;
pub mod email;
pub mod jwt;
pub mod scheduling;
