// src/posts/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// Create the posts router
///
/// # Routes
/// - `GET /posts?page=N` - Paginated post list
/// - `GET /post?id=ID` - Post details
/// - `POST /post` - Create post
/// - `PUT /post?id=ID` - Update post (author or admin)
/// - `DELETE /post?id=ID` - Delete post (author or admin)
pub fn posts_routes() -> Router {
    Router::new()
        .route("/posts", get(handlers::list_posts))
        .route(
            "/post",
            get(handlers::get_post)
                .post(handlers::create_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
}
