//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

/// The API database URL, preferring `API_DATABASE_URL` over `DATABASE_URL`.
fn database_url() -> Option<String> {
    std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}
