//! Fair-price shop handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use ration_tds_core::ShopId;

use crate::db::{ShopRepository, shops::NewShop};
use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, RequireAdmin};
use crate::models::shop::Shop;
use crate::state::AppState;

/// `GET /api/shops`
///
/// All registered shops. Any authenticated caller may browse the list.
pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<Shop>>, AppError> {
    let shops = ShopRepository::new(state.pool()).list().await?;
    Ok(Json(shops))
}

/// `GET /api/shops/{id}`
pub async fn show(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<ShopId>,
) -> Result<Json<Shop>, AppError> {
    let shop = ShopRepository::new(state.pool())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("shop {id}")))?;

    Ok(Json(shop))
}

/// Body for `POST /api/shops`.
#[derive(Debug, Deserialize)]
pub struct CreateShopBody {
    pub id: ShopId,
    pub name: String,
    pub address: Option<String>,
    pub district: Option<String>,
    pub contact: Option<String>,
    pub hours: Option<String>,
}

/// `POST /api/shops` (admin)
///
/// Register a new shop. Shop codes are caller-assigned and must be unique.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<CreateShopBody>,
) -> Result<Json<Shop>, AppError> {
    if body.id.as_str().trim().is_empty() {
        return Err(AppError::Validation("shop id must not be empty".to_owned()));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::Validation(
            "shop name must not be empty".to_owned(),
        ));
    }

    let new = NewShop {
        id: body.id,
        name: body.name.trim().to_owned(),
        address: body.address,
        district: body.district,
        contact: body.contact,
        hours: body.hours,
    };
    let shop = ShopRepository::new(state.pool()).create(&new).await?;

    Ok(Json(shop))
}
