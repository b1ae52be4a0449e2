//! HTTP handlers for registration and login.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::application::AuthService;
use crate::ports::AuthError;

use super::dto::{AuthResponse, CredentialsRequest, MeView};

/// Shared state for auth handlers.
#[derive(Clone)]
pub struct AuthAppState {
    pub auth: Arc<AuthService>,
}

fn map_auth_error(e: AuthError) -> ApiError {
    match e {
        AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".into()),
        AuthError::UsernameTaken => ApiError::BadRequest("Username already exists".into()),
        AuthError::InvalidUsername(reason) => ApiError::BadRequest(reason),
        AuthError::InvalidToken | AuthError::TokenExpired => {
            ApiError::Unauthorized("Invalid token".into())
        }
        AuthError::Internal(e) => ApiError::Internal(e),
    }
}

/// POST /api/auth/register - create an account and log it in.
pub async fn register(
    State(state): State<AuthAppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state
        .auth
        .register(&body.username, &body.password)
        .await
        .map_err(map_auth_error)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login - verify credentials and issue a token.
pub async fn login(
    State(state): State<AuthAppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state
        .auth
        .login(&body.username, &body.password)
        .await
        .map_err(map_auth_error)?;
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/me - the user behind the presented token.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<MeView> {
    Json(user.into())
}

/// POST /api/auth/logout - tokens are stateless, so logout is a
/// client-side discard; this endpoint exists for surface parity.
pub async fn logout(RequireAuth(_user): RequireAuth) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true }))
}
