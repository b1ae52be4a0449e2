//! Bearer-token middleware and extractors.
//!
//! The middleware validates `Authorization: Bearer <jwt>` headers and
//! injects the resolved [`AuthenticatedUser`] into request extensions;
//! handlers opt in to enforcement with the [`RequireAuth`] extractor. A
//! request without a token passes through so public routes (login,
//! register) share the same router.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{AuthenticatedUser, TokenIssuer};
use crate::ports::AuthError;

/// Middleware state: the token verifier.
pub type AuthState = Arc<TokenIssuer>;

/// Validates bearer tokens and injects the authenticated user.
pub async fn auth_middleware(
    State(tokens): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) => match tokens.verify(token) {
            Ok(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            Err(e) => {
                let message = match e {
                    AuthError::TokenExpired => "Token expired",
                    _ => "Invalid token",
                };
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({
                        "error": message,
                        "code": "auth_error"
                    })),
                )
                    .into_response()
            }
        },
        // No token: public routes continue, protected handlers reject via
        // RequireAuth.
        None => next.run(request).await,
    }
}

/// Extractor that rejects unauthenticated requests with 401.
pub struct RequireAuth(pub AuthenticatedUser);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "Not authenticated",
                    "code": "auth_error"
                })),
            ))
    }
}
