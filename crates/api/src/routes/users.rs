//! Admin user-management handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use ration_tds_core::{CardType, Period, Role, ShopId, UserId};

use crate::db::{AllocationRepository, UserRepository, users::UserFilter};
use crate::error::AppError;
use crate::middleware::auth::RequireAdmin;
use crate::models::allocation::MonthlyAllocation;
use crate::models::user::{UpdateUserInput, User, UserStats};
use crate::state::AppState;

/// Query for `GET /api/users`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub role: Option<Role>,
    pub shop_id: Option<ShopId>,
    pub card_type: Option<CardType>,
    pub flagged: Option<bool>,
    pub active: Option<bool>,
}

/// `GET /api/users` (admin)
///
/// Filtered user listing.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = UserRepository::new(state.pool())
        .list(&UserFilter {
            role: query.role,
            shop_id: query.shop_id,
            card_type: query.card_type,
            is_flagged: query.flagged,
            is_active: query.active,
        })
        .await?;

    Ok(Json(users))
}

/// `GET /api/users/stats` (admin)
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<UserStats>, AppError> {
    let stats = UserRepository::new(state.pool()).stats().await?;
    Ok(Json(stats))
}

/// A user profile with their current-month allocations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    /// Current-month allocations (empty for staff users).
    pub allocations: Vec<MonthlyAllocation>,
}

/// `GET /api/users/{id}` (admin)
///
/// A user's profile, with current-month allocations for cardholders.
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<UserDetail>, AppError> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    let allocations = if user.role == Role::Cardholder {
        AllocationRepository::new(state.pool())
            .ensure_for_period(id, Period::current())
            .await?
    } else {
        Vec::new()
    };

    Ok(Json(UserDetail { user, allocations }))
}

/// `PATCH /api/users/{id}` (admin)
///
/// Edit a user profile.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<User>, AppError> {
    if let Some(family_size) = input.family_size
        && family_size < 1
    {
        return Err(AppError::Validation(
            "familySize must be at least 1".to_owned(),
        ));
    }

    let user = UserRepository::new(state.pool())
        .update_profile(id, &input)
        .await?;

    Ok(Json(user))
}

/// Body for `PATCH /api/users/{id}/flag`.
#[derive(Debug, Deserialize)]
pub struct FlagBody {
    pub flagged: bool,
}

/// `PATCH /api/users/{id}/flag` (admin)
pub async fn set_flag(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<FlagBody>,
) -> Result<Json<User>, AppError> {
    let user = UserRepository::new(state.pool())
        .set_flagged(id, body.flagged)
        .await?;

    Ok(Json(user))
}

/// Body for `PATCH /api/users/{id}/active`.
#[derive(Debug, Deserialize)]
pub struct ActiveBody {
    pub active: bool,
}

/// `PATCH /api/users/{id}/active` (admin)
///
/// Activate or deactivate a user. Users are never hard-deleted.
pub async fn set_active(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<ActiveBody>,
) -> Result<Json<User>, AppError> {
    let user = UserRepository::new(state.pool())
        .set_active(id, body.active)
        .await?;

    Ok(Json(user))
}

/// `GET /api/users/{id}/allocations` (admin)
///
/// Ensure and return a user's current-month allocations.
pub async fn allocations(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<MonthlyAllocation>>, AppError> {
    let allocations = AllocationRepository::new(state.pool())
        .ensure_for_period(id, Period::current())
        .await?;

    Ok(Json(allocations))
}
