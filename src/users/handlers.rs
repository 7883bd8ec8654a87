// src/users/handlers.rs

use axum::{
    extract::{Extension, Query},
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::auth::{AuthedUser, User, UserResponse};
use crate::common::{ApiError, AppState};
use crate::users::models::*;

/// GET /user?id=ID - User profile with their posts
pub async fn get_user(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _authed: AuthedUser,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = fetch_user(&state, &params.id).await?;

    let posts = sqlx::query_as::<_, PostSummary>(
        "SELECT title, created_at FROM posts WHERE author_id = ? ORDER BY created_at DESC",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            user_id = %user.id,
            "Database error fetching user's posts"
        );
        ApiError::DatabaseError(e)
    })?;

    let posts_count = posts.len() as i64;

    Ok(Json(UserDetailResponse {
        user: UserResponse::from(user),
        posts,
        posts_count,
    }))
}

/// DELETE /user?id=ID - Delete a user and their posts (admin only)
pub async fn delete_user(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if !authed.is_admin {
        warn!(
            user_id = %authed.id,
            target_user_id = %params.id,
            "User deletion access denied: admin privileges required"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }

    let target = fetch_user(&state, &params.id).await?;

    if target.id == authed.id {
        warn!(
            user_id = %authed.id,
            "User deletion failed: cannot delete own account"
        );
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    // Posts go with their author in one transaction; a failure part-way
    // leaves neither the user nor the posts deleted.
    let mut tx = state.db.begin().await.map_err(|e| {
        error!(
            error = %e,
            target_user_id = %target.id,
            "Database error starting user deletion"
        );
        ApiError::DatabaseError(e)
    })?;

    let posts_deleted = sqlx::query("DELETE FROM posts WHERE author_id = ?")
        .bind(&target.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                target_user_id = %target.id,
                "Database error deleting user's posts"
            );
            ApiError::DatabaseError(e)
        })?
        .rows_affected();

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&target.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                target_user_id = %target.id,
                "Database error deleting user"
            );
            ApiError::DatabaseError(e)
        })?;

    tx.commit().await.map_err(|e| {
        error!(
            error = %e,
            target_user_id = %target.id,
            "Database error committing user deletion"
        );
        ApiError::DatabaseError(e)
    })?;

    info!(
        admin_user_id = %authed.id,
        target_user_id = %target.id,
        posts_deleted = posts_deleted,
        "User deleted successfully"
    );

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

// ---- Helper Functions ----

/// Look a user up by internal id or provider subject id.
async fn fetch_user(state: &AppState, id: &str) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? OR google_id = ?")
        .bind(id)
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, lookup_id = %id, "Database error fetching user");
            ApiError::DatabaseError(e)
        })?
        .ok_or_else(|| {
            warn!(lookup_id = %id, "User not found");
            ApiError::NotFound(format!("User not found: {}", id))
        })
}
