// src/users/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// Create the users router
///
/// # Routes
/// - `GET /user?id=ID` - User profile with their posts
/// - `DELETE /user?id=ID` - Delete a user and their posts (admin only)
pub fn users_routes() -> Router {
    Router::new().route(
        "/user",
        get(handlers::get_user).delete(handlers::delete_user),
    )
}
