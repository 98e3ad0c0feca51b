//! Notification handlers, including the card-type broadcast.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use ration_tds_core::{CardType, NotificationId, Role, ShopId, UserId};

use crate::db::{NotificationRepository, notifications::NewNotification};
use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, RequireStaff};
use crate::models::notification::Notification;
use crate::models::token::Token;
use crate::services::scheduling::SchedulingService;
use crate::state::AppState;

/// Query for `GET /api/notifications`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// `GET /api/notifications`
///
/// Notifications visible to the caller: their shop's plus global ones, or
/// global-only when the caller has no shop.
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = NotificationRepository::new(state.pool())
        .list_visible(user.shop_id.as_ref(), query.limit)
        .await?;

    Ok(Json(notifications))
}

/// Body for `POST /api/notifications`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub shop_id: Option<ShopId>,
    pub user_id: Option<UserId>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub message: String,
}

/// `POST /api/notifications` (staff)
///
/// Create a notification. Shopkeepers may only address their own shop.
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(actor): RequireStaff,
    Json(body): Json<CreateBody>,
) -> Result<Json<Notification>, AppError> {
    if body.notification_type.trim().is_empty() || body.message.trim().is_empty() {
        return Err(AppError::Validation(
            "type and message are required".to_owned(),
        ));
    }
    if actor.role == Role::Shopkeeper && body.shop_id != actor.shop_id {
        return Err(AppError::Forbidden(
            "shopkeepers can only notify their own shop".to_owned(),
        ));
    }

    let notification = NotificationRepository::new(state.pool())
        .create(&NewNotification {
            shop_id: body.shop_id,
            user_id: body.user_id,
            notification_type: body.notification_type,
            message: body.message,
        })
        .await?;

    Ok(Json(notification))
}

/// `PATCH /api/notifications/{id}/ack`
///
/// Acknowledge a notification.
pub async fn acknowledge(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>, AppError> {
    let notification = NotificationRepository::new(state.pool())
        .acknowledge(id)
        .await?;

    Ok(Json(notification))
}

/// Body for `POST /api/notifications/broadcast/card-type`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastBody {
    pub card_type: CardType,
    /// Shop to broadcast for; shopkeepers default to their own.
    pub shop_id: Option<ShopId>,
    pub interval_minutes: Option<i64>,
    pub start_at: Option<DateTime<Utc>>,
}

/// `POST /api/notifications/broadcast/card-type` (staff)
///
/// Assign tokens to every active cardholder of one card category, with one
/// notification per created token.
pub async fn broadcast_card_type(
    State(state): State<AppState>,
    RequireStaff(actor): RequireStaff,
    Json(body): Json<BroadcastBody>,
) -> Result<Json<Vec<Token>>, AppError> {
    if let Some(interval) = body.interval_minutes
        && interval < 1
    {
        return Err(AppError::Validation(
            "intervalMinutes must be positive".to_owned(),
        ));
    }

    let shop_id = match body.shop_id {
        Some(shop_id) => {
            if actor.role == Role::Shopkeeper && actor.shop_id.as_ref() != Some(&shop_id) {
                return Err(AppError::Forbidden(
                    "shopkeepers can only broadcast for their own shop".to_owned(),
                ));
            }
            shop_id
        }
        None => actor
            .shop_id
            .ok_or_else(|| AppError::Validation("shopId is required".to_owned()))?,
    };

    let tokens = SchedulingService::new(&state)
        .broadcast_by_card_type(&shop_id, body.card_type, body.interval_minutes, body.start_at)
        .await?;

    Ok(Json(tokens))
}
