//! Shop stock handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use ration_tds_core::{ItemCode, Role, ShopId, StockChangeType};

use crate::db::StockRepository;
use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, RequireAdmin, RequireStaff};
use crate::models::stock::{StockAuditEntry, StockItem};
use crate::state::AppState;

/// Default page size for the audit trail.
const AUDIT_LIMIT: i64 = 50;

/// Query for `GET /api/stocks`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub shop_id: Option<ShopId>,
}

/// `GET /api/stocks`
///
/// Stock levels at a shop. Defaults to the caller's shop.
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StockItem>>, AppError> {
    let shop_id = query
        .shop_id
        .or(user.shop_id)
        .ok_or_else(|| AppError::Validation("shopId is required".to_owned()))?;

    let items = StockRepository::new(state.pool())
        .list_for_shop(&shop_id)
        .await?;

    Ok(Json(items))
}

/// Body for `POST /api/stocks/update`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaBody {
    pub item_code: ItemCode,
    /// Signed change in quantity; the result is clamped at zero.
    pub delta: Decimal,
    /// Shop to update; shopkeepers default to their own.
    pub shop_id: Option<ShopId>,
}

/// `POST /api/stocks/update` (staff)
///
/// Apply a signed delta to one item. The result never goes below zero, and
/// the audit entry is best-effort.
pub async fn update_delta(
    State(state): State<AppState>,
    RequireStaff(actor): RequireStaff,
    Json(body): Json<DeltaBody>,
) -> Result<Json<StockItem>, AppError> {
    let shop_id = resolve_shop(&actor.role, actor.shop_id.clone(), body.shop_id)?;

    let item = StockRepository::new(state.pool())
        .apply_delta(
            &shop_id,
            &body.item_code,
            body.delta,
            actor.id,
            StockChangeType::ShopkeeperUpdate,
        )
        .await?;

    Ok(Json(item))
}

/// Body for `PATCH /api/stocks/{code}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityBody {
    pub quantity: Decimal,
    pub shop_id: ShopId,
}

/// `PATCH /api/stocks/{code}` (admin)
///
/// Set an absolute quantity for one item as a correction.
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(code): Path<ItemCode>,
    Json(body): Json<SetQuantityBody>,
) -> Result<Json<StockItem>, AppError> {
    if body.quantity < Decimal::ZERO {
        return Err(AppError::Validation(
            "quantity must be non-negative".to_owned(),
        ));
    }

    let item = StockRepository::new(state.pool())
        .set_quantity(&body.shop_id, &code, body.quantity, admin.id)
        .await?;

    Ok(Json(item))
}

/// Body for `POST /api/stocks/allocate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateBody {
    pub shop_id: ShopId,
    pub item_code: ItemCode,
    pub name: String,
    pub unit: Option<String>,
    pub quantity: Decimal,
}

/// `POST /api/stocks/allocate` (admin)
///
/// Record a government allocation to a shop, creating the stock row when
/// the shop has never carried the item.
pub async fn allocate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<AllocateBody>,
) -> Result<Json<StockItem>, AppError> {
    if body.quantity <= Decimal::ZERO {
        return Err(AppError::Validation(
            "quantity must be positive".to_owned(),
        ));
    }

    let item = StockRepository::new(state.pool())
        .allocate(
            &body.shop_id,
            &body.item_code,
            &body.name,
            body.unit.as_deref().unwrap_or("kg"),
            body.quantity,
            admin.id,
        )
        .await?;

    Ok(Json(item))
}

/// `GET /api/stocks/audit/{shopId}` (admin)
///
/// Recent stock changes at a shop, newest first.
pub async fn audit_log(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(shop_id): Path<ShopId>,
) -> Result<Json<Vec<StockAuditEntry>>, AppError> {
    let entries = StockRepository::new(state.pool())
        .audit_log(&shop_id, AUDIT_LIMIT)
        .await?;

    Ok(Json(entries))
}

/// Resolve which shop a staff caller may mutate.
fn resolve_shop(
    role: &Role,
    own_shop: Option<ShopId>,
    requested: Option<ShopId>,
) -> Result<ShopId, AppError> {
    match requested {
        Some(shop_id) => {
            if *role == Role::Shopkeeper && own_shop.as_ref() != Some(&shop_id) {
                return Err(AppError::Forbidden(
                    "shopkeepers can only update their own stock".to_owned(),
                ));
            }
            Ok(shop_id)
        }
        None => own_shop.ok_or_else(|| AppError::Validation("shopId is required".to_owned())),
    }
}
