// src/users/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::UserResponse;

// ============================================================================
// User Detail Models
// ============================================================================

/// Shortened post record shown on a user's profile page.
#[derive(FromRow, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub title: String,
    pub created_at: Option<String>,
}

/// GET /user?id=ID response: the user plus their recent posts.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailResponse {
    pub user: UserResponse,
    pub posts: Vec<PostSummary>,
    pub posts_count: i64,
}

/// `?id=` query parameter used by the user detail/delete endpoints.
/// Accepts the internal id or the provider subject id.
#[derive(Deserialize)]
pub struct UserIdQuery {
    pub id: String,
}
