//! Passwordless authentication handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use ration_tds_core::Email;

use crate::error::AppError;
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Body for `POST /api/auth/request-code`.
#[derive(Debug, Deserialize)]
pub struct RequestCodeBody {
    pub email: String,
}

/// Body for `POST /api/auth/verify-code`.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeBody {
    pub email: String,
    pub code: String,
    pub language: Option<String>,
}

/// Response for a successful sign-in.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/auth/request-code`
///
/// Issues a sign-in code to the address. The response does not reveal
/// whether the address belongs to an existing account.
pub async fn request_code(
    State(state): State<AppState>,
    Json(body): Json<RequestCodeBody>,
) -> Result<Json<Value>, AppError> {
    let email = Email::parse(&body.email).map_err(|e| AppError::Validation(e.to_string()))?;

    AuthService::new(&state).request_code(&email).await?;

    Ok(Json(json!({ "success": true })))
}

/// `POST /api/auth/verify-code`
///
/// Redeems a sign-in code for a bearer token, creating a cardholder
/// account on first sign-in.
pub async fn verify_code(
    State(state): State<AppState>,
    Json(body): Json<VerifyCodeBody>,
) -> Result<Json<SignInResponse>, AppError> {
    let email = Email::parse(&body.email).map_err(|e| AppError::Validation(e.to_string()))?;
    if body.code.len() != 6 || !body.code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("code must be 6 digits".to_owned()));
    }

    let sign_in = AuthService::new(&state)
        .verify_code(&email, &body.code, body.language.as_deref())
        .await?;

    Ok(Json(SignInResponse {
        token: sign_in.token,
        user: sign_in.user,
    }))
}
