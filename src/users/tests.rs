//! Tests for users module
//!
//! These tests verify the user detail wire shape and the admin-only delete
//! flow against an in-memory database.

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::extract::{Extension, Query};
    use reqwest::Client;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::auth::{AuthedUser, UserResponse};
    use crate::common::{migrations, ApiError, AppState};
    use crate::services::{GoogleService, IdentityExchange};

    async fn test_state() -> Arc<RwLock<AppState>> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory database should open");
        migrations::run_migrations(&pool).await.expect("migrations should run");

        let http = Client::new();
        Arc::new(RwLock::new(AppState {
            db: pool,
            jwt_secret: "test_secret_key".to_string(),
            admin_emails: HashSet::new(),
            frontend_url: "http://localhost:3000".to_string(),
            posts_per_page: 10,
            google_service: Arc::new(GoogleService::new(http.clone(), None, None)),
            identity_exchange: Arc::new(IdentityExchange::new(
                http,
                "test_secret_key".to_string(),
                "http://localhost:9000/user/login".to_string(),
            )),
        }))
    }

    async fn insert_user(pool: &SqlitePool, id: &str, email: &str, role: &str) {
        sqlx::query("INSERT INTO users (id, email, role) VALUES (?, ?, ?)")
            .bind(id)
            .bind(email)
            .bind(role)
            .execute(pool)
            .await
            .expect("user insert should succeed");
    }

    async fn insert_post(pool: &SqlitePool, id: &str, author_id: &str) {
        sqlx::query("INSERT INTO posts (id, title, content, author_id) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind("Sprzedam rower")
            .bind("Stan dobry")
            .bind(author_id)
            .execute(pool)
            .await
            .expect("post insert should succeed");
    }

    async fn count(pool: &SqlitePool, sql: &str, bind: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .bind(bind)
            .fetch_one(pool)
            .await
            .expect("count query should succeed")
    }

    fn admin() -> AuthedUser {
        AuthedUser {
            id: "U_ADMIN1".to_string(),
            email: "admin@example.com".to_string(),
            is_admin: true,
        }
    }

    #[tokio::test]
    async fn test_delete_user_removes_user_and_their_posts() {
        let state = test_state().await;
        let pool = state.read().await.db.clone();

        insert_user(&pool, "U_ADMIN1", "admin@example.com", "admin").await;
        insert_user(&pool, "U_TARGET", "target@example.com", "user").await;
        insert_user(&pool, "U_OTHER1", "other@example.com", "user").await;
        insert_post(&pool, "P_AAAAAA", "U_TARGET").await;
        insert_post(&pool, "P_BBBBBB", "U_TARGET").await;
        insert_post(&pool, "P_CCCCCC", "U_OTHER1").await;

        handlers::delete_user(
            Extension(state.clone()),
            admin(),
            Query(models::UserIdQuery {
                id: "U_TARGET".to_string(),
            }),
        )
        .await
        .expect("admin should be able to delete a user");

        let users_left = count(&pool, "SELECT COUNT(*) FROM users WHERE id = ?", "U_TARGET").await;
        assert_eq!(users_left, 0, "target user row should be gone");

        let target_posts =
            count(&pool, "SELECT COUNT(*) FROM posts WHERE author_id = ?", "U_TARGET").await;
        assert_eq!(target_posts, 0, "target's posts should be gone with them");

        let other_posts =
            count(&pool, "SELECT COUNT(*) FROM posts WHERE author_id = ?", "U_OTHER1").await;
        assert_eq!(other_posts, 1, "other users' posts must be untouched");
    }

    #[tokio::test]
    async fn test_delete_user_rejects_non_admin() {
        let state = test_state().await;
        let pool = state.read().await.db.clone();

        insert_user(&pool, "U_CALLER", "caller@example.com", "user").await;
        insert_user(&pool, "U_TARGET", "target@example.com", "user").await;

        let result = handlers::delete_user(
            Extension(state.clone()),
            AuthedUser {
                id: "U_CALLER".to_string(),
                email: "caller@example.com".to_string(),
                is_admin: false,
            },
            Query(models::UserIdQuery {
                id: "U_TARGET".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Forbidden(_))));
        let users_left = count(&pool, "SELECT COUNT(*) FROM users WHERE id = ?", "U_TARGET").await;
        assert_eq!(users_left, 1);
    }

    #[test]
    fn test_user_detail_response_wire_shape() {
        let detail = models::UserDetailResponse {
            user: UserResponse {
                google_id: "108204".to_string(),
                name: Some("Jan Kowalski".to_string()),
                email: "jan@example.com".to_string(),
                picture: None,
                role: "admin".to_string(),
            },
            posts: vec![
                models::PostSummary {
                    title: "Sprzedam rower".to_string(),
                    created_at: Some("2024-03-01 10:00:00".to_string()),
                },
                models::PostSummary {
                    title: "Kupię garaż".to_string(),
                    created_at: Some("2024-02-20 18:15:00".to_string()),
                },
            ],
            posts_count: 2,
        };

        let json = serde_json::to_value(detail).expect("response should serialize");

        assert_eq!(json["user"]["googleId"], "108204");
        assert_eq!(json["user"]["role"], "admin");
        assert_eq!(json["postsCount"], 2);
        assert_eq!(json["posts"][0]["title"], "Sprzedam rower");
        assert_eq!(json["posts"][0]["createdAt"], "2024-03-01 10:00:00");
    }
}
