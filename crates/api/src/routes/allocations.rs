//! Allocation handlers for cardholders and admins.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use ration_tds_core::{AllocationId, ItemCode, Period, UserId};

use crate::db::{AllocationRepository, allocations::DistributionError};
use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, RequireAdmin};
use crate::models::allocation::{MonthlyAllocation, MonthlyHistoryGroup};
use crate::state::AppState;

/// Months of history the grouped view returns.
const HISTORY_MONTHS: i32 = 6;

/// `GET /api/allocations/my`
///
/// Ensures and returns the caller's current-month allocations.
pub async fn my(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<MonthlyAllocation>>, AppError> {
    let allocations = AllocationRepository::new(state.pool())
        .ensure_for_period(user.id, Period::current())
        .await?;

    Ok(Json(allocations))
}

/// Query for `GET /api/allocations`.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub month: i32,
    pub year: i32,
}

/// `GET /api/allocations?month=&year=`
///
/// The caller's allocations for an explicit period. Past periods are
/// returned as stored, never fabricated.
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<MonthlyAllocation>>, AppError> {
    let period = Period::new(query.month, query.year)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let allocations = AllocationRepository::new(state.pool())
        .list_for_period(user.id, period)
        .await?;

    Ok(Json(allocations))
}

/// Body for `POST /api/allocations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEligibleBody {
    pub user_id: UserId,
    pub item_code: ItemCode,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub quantity: Decimal,
}

/// `POST /api/allocations` (admin)
///
/// Upsert an eligible quantity, overriding the policy-derived value.
pub async fn set_eligible(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<SetEligibleBody>,
) -> Result<Json<MonthlyAllocation>, AppError> {
    if body.quantity < Decimal::ZERO {
        return Err(AppError::Validation(
            "quantity must be non-negative".to_owned(),
        ));
    }

    let period = match (body.month, body.year) {
        (Some(month), Some(year)) => {
            Period::new(month, year).map_err(|e| AppError::Validation(e.to_string()))?
        }
        _ => Period::current(),
    };

    let allocation = AllocationRepository::new(state.pool())
        .set_eligible(body.user_id, &body.item_code, period, body.quantity, admin.id)
        .await?;

    Ok(Json(allocation))
}

/// Body for `PATCH /api/allocations/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectBody {
    pub collected_quantity: Decimal,
    pub reason: Option<String>,
}

/// `PATCH /api/allocations/{id}` (admin)
///
/// Correct the collected quantity on a specific allocation row. The cap
/// check and the change-log append match the shopkeeper distribution path.
pub async fn correct(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<AllocationId>,
    Json(body): Json<CorrectBody>,
) -> Result<Json<MonthlyAllocation>, AppError> {
    if body.collected_quantity < Decimal::ZERO {
        return Err(AppError::Validation(
            "collectedQuantity must be non-negative".to_owned(),
        ));
    }

    let result = AllocationRepository::new(state.pool())
        .correct_collected(
            id,
            body.collected_quantity,
            admin.id,
            admin.role,
            body.reason.as_deref(),
        )
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

/// `GET /api/allocations/user/{userId}/history`
///
/// The last six months of a user's allocations, grouped by month. Users may
/// read their own history; staff may read anyone's.
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<MonthlyHistoryGroup>>, AppError> {
    if user.id != user_id && !user.role.is_staff() {
        return Err(AppError::Forbidden(
            "cannot read another user's history".to_owned(),
        ));
    }

    let groups = AllocationRepository::new(state.pool())
        .monthly_history(user_id, HISTORY_MONTHS)
        .await?;

    Ok(Json(groups))
}
