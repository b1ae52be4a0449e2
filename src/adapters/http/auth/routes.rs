//! Axum routes for auth endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{login, logout, me, register, AuthAppState};

/// Creates routes for auth endpoints.
///
/// - `POST /register` - create an account
/// - `POST /login` - verify credentials, issue token
/// - `POST /logout` - client-side token discard
/// - `GET /me` - current user
pub fn auth_routes() -> Router<AuthAppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_routes_creates_valid_router() {
        let _routes = auth_routes();
    }
}
