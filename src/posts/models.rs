// src/posts/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Post Models
// ============================================================================

/// Post row joined with its author, as read from the database.
#[derive(FromRow, Debug)]
pub struct PostWithAuthor {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    // NULL when the author row no longer exists
    pub author_user_id: Option<String>,
    pub author_google_id: Option<String>,
    pub author_name: Option<String>,
    pub author_picture: Option<String>,
}

/// Embedded author reference on the wire: the resolved user, or the raw
/// author id when the reference does not resolve. Clients render a
/// placeholder for the raw form.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum PostAuthor {
    #[serde(rename_all = "camelCase")]
    Resolved {
        google_id: String,
        name: Option<String>,
        picture: Option<String>,
    },
    Raw(String),
}

/// Post as served to clients. Field names follow the frontend contract.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: PostAuthor,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<PostWithAuthor> for PostResponse {
    fn from(row: PostWithAuthor) -> Self {
        let author = match row.author_user_id {
            Some(user_id) => PostAuthor::Resolved {
                // Same fallback as UserResponse: internal id stands in when
                // no provider subject was recorded.
                google_id: row.author_google_id.unwrap_or(user_id),
                name: row.author_name,
                picture: row.author_picture,
            },
            None => PostAuthor::Raw(row.author_id),
        };

        PostResponse {
            id: row.id,
            title: row.title,
            content: row.content,
            author,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Paginated post list response
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_posts: i64,
}

/// Number of pages needed for `total` posts at `per_page` posts per page.
pub fn total_pages(total: i64, per_page: usize) -> usize {
    if total <= 0 || per_page == 0 {
        return 0;
    }
    ((total as usize) + per_page - 1) / per_page
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize, Debug)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
}

/// `?id=` query parameter used by the post detail/update/delete endpoints.
#[derive(Deserialize)]
pub struct PostIdQuery {
    pub id: String,
}

/// `?page=` query parameter for the post list.
#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}
