//! Authentication extractors for bearer-token routes.
//!
//! Handlers declare the access level they need by taking one of these
//! extractors; role checks are exhaustive matches over [`Role`], so adding
//! a role is a compile-time-checked change.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use ration_tds_core::{Role, ShopId, UserId};

use crate::services::jwt::Claims;
use crate::state::AppState;

/// The authenticated caller, as carried by their bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub shop_id: Option<ShopId>,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id(),
            shop_id: claims.shop(),
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Rejection for failed authentication or authorization.
pub enum AuthRejection {
    /// Missing, malformed or expired bearer token.
    Unauthorized,
    /// Valid token, insufficient role.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing or invalid bearer token",
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "insufficient role"),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AuthRejection> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthRejection::Unauthorized)?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthRejection::Unauthorized)?;

    let claims = state
        .jwt()
        .verify(token)
        .map_err(|_| AuthRejection::Unauthorized)?;

    let user = CurrentUser::from(claims);
    crate::error::set_sentry_user(user.id.as_i32(), &user.email);
    Ok(user)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        authenticate(parts, &state)
    }
}

/// Extractor requiring a staff caller (shopkeeper or admin).
pub struct RequireStaff(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireStaff
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = authenticate(parts, &state)?;
        match user.role {
            Role::Shopkeeper | Role::Admin => Ok(Self(user)),
            Role::Cardholder => Err(AuthRejection::Forbidden),
        }
    }
}

/// Extractor requiring an admin caller.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = authenticate(parts, &state)?;
        match user.role {
            Role::Admin => Ok(Self(user)),
            Role::Cardholder | Role::Shopkeeper => Err(AuthRejection::Forbidden),
        }
    }
}
