//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /login` - Provider authorization URL
/// - `GET /oauth/callback` - Provider callback completing the identity exchange
/// - `POST /user/login` - Bearer-assertion login issuing the session token
/// - `GET /user/me` - Current user
/// - `GET /oauth/logout` - Logout confirmation
pub fn auth_routes() -> Router {
    Router::new()
        .route("/login", get(handlers::login_url))
        .route("/oauth/callback", get(handlers::oauth_callback))
        .route("/oauth/logout", get(handlers::logout_handler))
        .route("/user/login", post(handlers::user_login))
        .route("/user/me", get(handlers::me_handler))
}
