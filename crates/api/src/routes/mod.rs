//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (db ping)
//!
//! # Auth (passwordless, /api/auth)
//! POST /api/auth/request-code      - Email a sign-in code
//! POST /api/auth/verify-code       - Redeem code for a bearer token
//!
//! # Allocations (/api/allocations)
//! GET  /api/allocations/my         - Caller's current-month allocations (ensured)
//! GET  /api/allocations            - Explicit month/year query for the caller
//! POST /api/allocations            - Admin upsert of an eligible quantity
//! PATCH /api/allocations/{id}      - Admin correction of a collected quantity
//! GET  /api/allocations/user/{userId}/history - Six-month grouped history
//!
//! # Shopkeeper (/api/shopkeeper, staff only)
//! GET    /api/shopkeeper/quota/{userId}         - Ensure+return a user's allocations
//! PATCH  /api/shopkeeper/quota/{userId}         - Record a distribution
//! GET    /api/shopkeeper/quota-history/{userId} - Last 20 quota changes
//! GET    /api/shopkeeper/customers/{shopId}     - Cardholders of a shop
//!
//! # Tokens (/api/tokens)
//! POST  /api/tokens                - Book a token at the caller's shop
//! GET   /api/tokens/my             - Caller's token for today
//! GET   /api/tokens                - Shop queue for a date (staff)
//! PATCH /api/tokens/{id}           - Move a token through its lifecycle (staff)
//!
//! # Notifications (/api/notifications)
//! GET   /api/notifications         - Visible notifications (shop + global)
//! POST  /api/notifications         - Create (staff)
//! PATCH /api/notifications/{id}/ack - Acknowledge
//! POST  /api/notifications/broadcast/card-type - Card-type token broadcast (staff)
//!
//! # Stocks (/api/stocks)
//! GET   /api/stocks                - Shop stock levels
//! POST  /api/stocks/update         - Delta update, clamped at zero (staff)
//! PATCH /api/stocks/{code}         - Absolute correction (admin)
//! POST  /api/stocks/allocate       - Government allocation (admin)
//! GET   /api/stocks/audit/{shopId} - Audit trail (admin)
//!
//! # Users (/api/users, admin)
//! GET   /api/users                 - Filtered listing
//! GET   /api/users/stats           - Aggregate counts
//! GET   /api/users/{id}            - Profile (with current allocations for cardholders)
//! PATCH /api/users/{id}            - Profile edit
//! PATCH /api/users/{id}/flag       - Flag/unflag
//! PATCH /api/users/{id}/active     - Activate/deactivate
//! GET   /api/users/{id}/allocations - Current-month allocations (ensured)
//!
//! # Shops (/api/shops)
//! GET  /api/shops                  - Listing
//! GET  /api/shops/{id}             - Detail
//! POST /api/shops                  - Register (admin)
//!
//! # Complaints (/api/complaints)
//! POST  /api/complaints            - File a complaint
//! GET   /api/complaints/my         - Caller's complaints
//! GET   /api/complaints            - All complaints (staff)
//! PATCH /api/complaints/{id}       - Status change (staff)
//! ```

pub mod allocations;
pub mod auth;
pub mod complaints;
pub mod health;
pub mod notifications;
pub mod shopkeeper;
pub mod shops;
pub mod stocks;
pub mod tokens;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the auth routes router.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/request-code", post(auth::request_code))
        .route("/verify-code", post(auth::verify_code))
}

/// Create the allocation routes router.
fn allocation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(allocations::list).post(allocations::set_eligible))
        .route("/my", get(allocations::my))
        .route("/{id}", patch(allocations::correct))
        .route("/user/{user_id}/history", get(allocations::history))
}

/// Create the shopkeeper routes router.
fn shopkeeper_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/quota/{user_id}",
            get(shopkeeper::quota).patch(shopkeeper::distribute),
        )
        .route("/quota-history/{user_id}", get(shopkeeper::quota_history))
        .route("/customers/{shop_id}", get(shopkeeper::customers))
}

/// Create the token routes router.
fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(tokens::book).get(tokens::queue))
        .route("/my", get(tokens::my))
        .route("/{id}", patch(tokens::set_status))
}

/// Create the notification routes router.
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::list).post(notifications::create))
        .route("/{id}/ack", patch(notifications::acknowledge))
        .route(
            "/broadcast/card-type",
            post(notifications::broadcast_card_type),
        )
}

/// Create the stock routes router.
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stocks::list))
        .route("/update", post(stocks::update_delta))
        .route("/allocate", post(stocks::allocate))
        .route("/audit/{shop_id}", get(stocks::audit_log))
        .route("/{code}", patch(stocks::set_quantity))
}

/// Create the user admin routes router.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route("/stats", get(users::stats))
        .route("/{id}", get(users::show).patch(users::update))
        .route("/{id}/flag", patch(users::set_flag))
        .route("/{id}/active", patch(users::set_active))
        .route("/{id}/allocations", get(users::allocations))
}

/// Create the shop routes router.
fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shops::list).post(shops::create))
        .route("/{id}", get(shops::show))
}

/// Create the complaint routes router.
fn complaint_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(complaints::create).get(complaints::list_all))
        .route("/my", get(complaints::my))
        .route("/{id}", patch(complaints::set_status))
}

/// Assemble the full application router.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .nest("/allocations", allocation_routes())
        .nest("/shopkeeper", shopkeeper_routes())
        .nest("/tokens", token_routes())
        .nest("/notifications", notification_routes())
        .nest("/stocks", stock_routes())
        .nest("/users", user_routes())
        .nest("/shops", shop_routes())
        .nest("/complaints", complaint_routes());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/api", api)
}
