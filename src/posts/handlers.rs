// src/posts/handlers.rs

use axum::{
    extract::{Extension, Query},
    response::Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::auth::AuthedUser;
use crate::common::{generate_post_id, ApiError, AppState, Validator};
use crate::posts::models::*;
use crate::posts::validators::PostValidator;

const POST_WITH_AUTHOR_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.content, p.author_id, p.created_at, p.updated_at,
        u.id AS author_user_id,
        u.google_id AS author_google_id,
        u.name AS author_name,
        u.picture AS author_picture
    FROM posts p
    LEFT JOIN users u ON u.id = p.author_id
"#;

/// Whether `authed` may modify a post owned by `author_id`.
pub fn can_modify_post(authed: &AuthedUser, author_id: &str) -> bool {
    authed.is_admin || authed.id == author_id
}

/// GET /posts?page=N - Paginated post list, newest first
pub async fn list_posts(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _authed: AuthedUser,
    Query(params): Query<PageQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let page = params.page.unwrap_or(1).max(1);
    let per_page = state.posts_per_page;
    let offset = (page - 1) * per_page;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let query = format!(
        "{} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        POST_WITH_AUTHOR_SELECT
    );
    let rows = sqlx::query_as::<_, PostWithAuthor>(&query)
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let posts: Vec<PostResponse> = rows.into_iter().map(|r| r.into()).collect();

    debug!(
        post_count = posts.len(),
        total = total,
        page = page,
        per_page = per_page,
        "Successfully loaded paginated post list"
    );

    Ok(Json(PostListResponse {
        posts,
        current_page: page,
        total_pages: total_pages(total, per_page),
        total_posts: total,
    }))
}

/// GET /post?id=ID - Get a specific post
pub async fn get_post(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _authed: AuthedUser,
    Query(params): Query<PostIdQuery>,
) -> Result<Json<PostResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let row = fetch_post_with_author(&state, &params.id).await?;

    debug!(post_id = %params.id, "Successfully loaded post details");

    Ok(Json(row.into()))
}

/// POST /post - Create a post owned by the authenticated user
pub async fn create_post(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = PostValidator.validate(&request);
    if !validation_result.is_valid {
        warn!(
            user_id = %authed.id,
            errors = ?validation_result.errors,
            "Post creation validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let post_id = generate_post_id();
    sqlx::query(
        r#"
        INSERT INTO posts (id, title, content, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, datetime('now'), datetime('now'))
        "#,
    )
    .bind(&post_id)
    .bind(request.title.trim())
    .bind(request.content.trim())
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            post_id = %post_id,
            user_id = %authed.id,
            "Database error creating post"
        );
        ApiError::DatabaseError(e)
    })?;

    info!(
        post_id = %post_id,
        user_id = %authed.id,
        "Post created successfully"
    );

    let row = fetch_post_with_author(&state, &post_id).await?;
    Ok(Json(row.into()))
}

/// PUT /post?id=ID - Update a post (author or admin only)
pub async fn update_post(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(params): Query<PostIdQuery>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = PostValidator.validate(&request);
    if !validation_result.is_valid {
        warn!(
            post_id = %params.id,
            user_id = %authed.id,
            errors = ?validation_result.errors,
            "Post update validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let author_id = fetch_post_author(&state, &params.id).await?;

    if !can_modify_post(&authed, &author_id) {
        warn!(
            post_id = %params.id,
            user_id = %authed.id,
            author_id = %author_id,
            "Post update denied: requester is neither author nor admin"
        );
        return Err(ApiError::Forbidden(
            "Only the author or an admin can edit this post".to_string(),
        ));
    }

    sqlx::query("UPDATE posts SET title = ?, content = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(request.title.trim())
        .bind(request.content.trim())
        .bind(&params.id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                post_id = %params.id,
                "Database error updating post"
            );
            ApiError::DatabaseError(e)
        })?;

    info!(
        post_id = %params.id,
        user_id = %authed.id,
        "Post updated successfully"
    );

    let row = fetch_post_with_author(&state, &params.id).await?;
    Ok(Json(row.into()))
}

/// DELETE /post?id=ID - Delete a post (author or admin only)
pub async fn delete_post(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(params): Query<PostIdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let author_id = fetch_post_author(&state, &params.id).await?;

    if !can_modify_post(&authed, &author_id) {
        warn!(
            post_id = %params.id,
            user_id = %authed.id,
            author_id = %author_id,
            "Post deletion denied: requester is neither author nor admin"
        );
        return Err(ApiError::Forbidden(
            "Only the author or an admin can delete this post".to_string(),
        ));
    }

    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(&params.id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                post_id = %params.id,
                "Database error deleting post"
            );
            ApiError::DatabaseError(e)
        })?;

    info!(
        post_id = %params.id,
        user_id = %authed.id,
        "Post deleted successfully"
    );

    Ok(Json(serde_json::json!({ "message": "Post deleted" })))
}

// ---- Helper Functions ----

async fn fetch_post_with_author(
    state: &AppState,
    post_id: &str,
) -> Result<PostWithAuthor, ApiError> {
    let query = format!("{} WHERE p.id = ?", POST_WITH_AUTHOR_SELECT);
    sqlx::query_as::<_, PostWithAuthor>(&query)
        .bind(post_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound(format!("Post not found: {}", post_id)))
}

async fn fetch_post_author(state: &AppState, post_id: &str) -> Result<String, ApiError> {
    sqlx::query_scalar::<_, String>("SELECT author_id FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound(format!("Post not found: {}", post_id)))
}
