//! Queue token handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use ration_tds_core::{Role, ShopId, TokenId, TokenStatus};

use crate::db::TokenRepository;
use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, RequireStaff};
use crate::models::token::Token;
use crate::services::scheduling::SchedulingService;
use crate::state::AppState;

/// Body for `POST /api/tokens`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookBody {
    /// Collection date; defaults to today.
    pub date: Option<NaiveDate>,
    /// Display slot; defaults to "10:00 AM".
    pub time_slot: Option<String>,
}

/// `POST /api/tokens`
///
/// Book a token at the caller's own shop.
pub async fn book(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<BookBody>,
) -> Result<Json<Token>, AppError> {
    let shop_id = user.shop_id.ok_or_else(|| {
        AppError::Validation("caller has no shop to book a token at".to_owned())
    })?;
    let date = body.date.unwrap_or_else(|| Utc::now().date_naive());

    let token = SchedulingService::new(&state)
        .book(&shop_id, user.id, date, body.time_slot)
        .await?;

    Ok(Json(token))
}

/// `GET /api/tokens/my`
///
/// The caller's token for today, if any.
pub async fn my(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Option<Token>>, AppError> {
    let token = TokenRepository::new(state.pool())
        .find_for_user(user.id, Utc::now().date_naive())
        .await?;

    Ok(Json(token))
}

/// Query for `GET /api/tokens`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueQuery {
    /// Shop to list; shopkeepers default to their own.
    pub shop_id: Option<ShopId>,
    /// Queue date; defaults to today.
    pub date: Option<NaiveDate>,
}

/// `GET /api/tokens` (staff)
///
/// A shop's queue for one date, in position order.
pub async fn queue(
    State(state): State<AppState>,
    RequireStaff(actor): RequireStaff,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Vec<Token>>, AppError> {
    let shop_id = match query.shop_id {
        Some(shop_id) => {
            if actor.role == Role::Shopkeeper && actor.shop_id.as_ref() != Some(&shop_id) {
                return Err(AppError::Forbidden(
                    "shopkeepers can only view their own queue".to_owned(),
                ));
            }
            shop_id
        }
        None => actor
            .shop_id
            .ok_or_else(|| AppError::Validation("shopId is required".to_owned()))?,
    };
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let tokens = TokenRepository::new(state.pool())
        .list_for_shop(&shop_id, date)
        .await?;

    Ok(Json(tokens))
}

/// Body for `PATCH /api/tokens/{id}`.
#[derive(Debug, Deserialize)]
pub struct SetStatusBody {
    pub status: TokenStatus,
}

/// `PATCH /api/tokens/{id}` (staff)
///
/// Move a token through its lifecycle (serve, cancel, ...).
pub async fn set_status(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(id): Path<TokenId>,
    Json(body): Json<SetStatusBody>,
) -> Result<Json<Token>, AppError> {
    let token = TokenRepository::new(state.pool())
        .set_status(&id, body.status)
        .await?;

    Ok(Json(token))
}
