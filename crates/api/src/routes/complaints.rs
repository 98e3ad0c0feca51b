//! Complaint handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use ration_tds_core::{ComplaintId, ComplaintStatus, ShopId};

use crate::db::ComplaintRepository;
use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, RequireStaff};
use crate::models::complaint::Complaint;
use crate::state::AppState;

/// Body for `POST /api/complaints`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub subject: String,
    pub description: String,
    /// Defaults to the caller's own shop.
    pub shop_id: Option<ShopId>,
}

/// `POST /api/complaints`
///
/// File a complaint against a shop (or a general one, when the caller has
/// no shop assignment and names none).
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateBody>,
) -> Result<Json<Complaint>, AppError> {
    if body.subject.trim().is_empty() {
        return Err(AppError::Validation("subject must not be empty".to_owned()));
    }
    if body.description.trim().is_empty() {
        return Err(AppError::Validation(
            "description must not be empty".to_owned(),
        ));
    }

    let shop_id = body.shop_id.or(user.shop_id);
    let complaint = ComplaintRepository::new(state.pool())
        .create(
            user.id,
            shop_id.as_ref(),
            body.subject.trim(),
            body.description.trim(),
        )
        .await?;

    Ok(Json(complaint))
}

/// `GET /api/complaints/my`
pub async fn my(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Complaint>>, AppError> {
    let complaints = ComplaintRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(complaints))
}

/// Query for `GET /api/complaints`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<ComplaintStatus>,
}

/// `GET /api/complaints` (staff)
///
/// All complaints, optionally filtered by status.
pub async fn list_all(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Complaint>>, AppError> {
    let complaints = ComplaintRepository::new(state.pool())
        .list_all(query.status)
        .await?;

    Ok(Json(complaints))
}

/// Body for `PATCH /api/complaints/{id}`.
#[derive(Debug, Deserialize)]
pub struct SetStatusBody {
    pub status: ComplaintStatus,
}

/// `PATCH /api/complaints/{id}` (staff)
///
/// Move a complaint through its lifecycle.
pub async fn set_status(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(id): Path<ComplaintId>,
    Json(body): Json<SetStatusBody>,
) -> Result<Json<Complaint>, AppError> {
    let complaint = ComplaintRepository::new(state.pool())
        .set_status(id, body.status)
        .await?;

    Ok(Json(complaint))
}
