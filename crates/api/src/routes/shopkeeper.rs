//! Shopkeeper handlers: quota viewing, distribution and customers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use ration_tds_core::{ItemCode, Period, Role, ShopId, UserId};

use crate::db::{
    AllocationRepository, UserRepository,
    allocations::{DistributeRequest, DistributionError},
    users::UserFilter,
};
use crate::error::AppError;
use crate::middleware::auth::RequireStaff;
use crate::models::allocation::{AllocationHistoryEntry, MonthlyAllocation};
use crate::models::user::User;
use crate::state::AppState;

/// `GET /api/shopkeeper/quota/{userId}` (staff)
///
/// Ensure and return a cardholder's current-month allocations.
pub async fn quota(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<MonthlyAllocation>>, AppError> {
    let allocations = AllocationRepository::new(state.pool())
        .ensure_for_period(user_id, Period::current())
        .await?;

    Ok(Json(allocations))
}

/// Body for `PATCH /api/shopkeeper/quota/{userId}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeBody {
    pub item_code: ItemCode,
    pub new_quantity: Decimal,
    pub reason: Option<String>,
}

/// `PATCH /api/shopkeeper/quota/{userId}` (staff)
///
/// Record a distribution. 400 when the cap is exceeded (with the cap in the
/// message), 404 when no allocation row exists for the current month.
pub async fn distribute(
    State(state): State<AppState>,
    RequireStaff(actor): RequireStaff,
    Path(user_id): Path<UserId>,
    Json(body): Json<DistributeBody>,
) -> Result<Json<MonthlyAllocation>, AppError> {
    if body.new_quantity < Decimal::ZERO {
        return Err(AppError::Validation(
            "newQuantity must be non-negative".to_owned(),
        ));
    }

    let result = AllocationRepository::new(state.pool())
        .distribute(&DistributeRequest {
            user_id,
            item_code: body.item_code,
            new_collected_quantity: body.new_quantity,
            actor_id: actor.id,
            actor_role: actor.role,
            reason: body.reason,
            period: Period::current(),
        })
        .await;

    match result {
        Ok(allocation) => Ok(Json(allocation)),
        Err(DistributionError::ExceedsEligible {
            requested,
            eligible,
        }) => Err(AppError::Validation(format!(
            "collected quantity {requested} exceeds eligible quantity {eligible}"
        ))),
        Err(e @ DistributionError::AllocationMissing { .. }) => {
            Err(AppError::NotFound(e.to_string()))
        }
        Err(DistributionError::Repository(e)) => Err(AppError::Database(e)),
    }
}

/// `GET /api/shopkeeper/quota-history/{userId}` (staff)
///
/// The user's last 20 quota changes, newest first, with actor names.
pub async fn quota_history(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<AllocationHistoryEntry>>, AppError> {
    let entries = AllocationRepository::new(state.pool())
        .recent_changes(user_id)
        .await?;

    Ok(Json(entries))
}

/// `GET /api/shopkeeper/customers/{shopId}` (staff)
///
/// Cardholders assigned to a shop. Shopkeepers can only read their own shop.
pub async fn customers(
    State(state): State<AppState>,
    RequireStaff(actor): RequireStaff,
    Path(shop_id): Path<ShopId>,
) -> Result<Json<Vec<User>>, AppError> {
    if actor.role == Role::Shopkeeper && actor.shop_id.as_ref() != Some(&shop_id) {
        return Err(AppError::Forbidden(
            "shopkeepers can only list their own shop's customers".to_owned(),
        ));
    }

    let users = UserRepository::new(state.pool())
        .list(&UserFilter {
            role: Some(Role::Cardholder),
            shop_id: Some(shop_id),
            ..UserFilter::default()
        })
        .await?;

    Ok(Json(users))
}
