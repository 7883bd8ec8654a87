//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - Session token validation
//! - User model structure and wire shape
//! - Claims structure

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::extract::Extension;
    use axum::http::{header::AUTHORIZATION, HeaderMap};
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use reqwest::Client;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::common::{migrations, AppState};
    use crate::services::{GoogleService, IdentityExchange};

    fn sample_user() -> models::User {
        models::User {
            id: "U_K7NP3X".to_string(),
            google_id: Some("108204".to_string()),
            email: "jan@example.com".to_string(),
            name: Some("Jan Kowalski".to_string()),
            picture: Some("https://p.example/a.png".to_string()),
            role: "user".to_string(),
            created_at: Some("2024-01-01 00:00:00".to_string()),
        }
    }

    #[test]
    fn test_claims_structure() {
        let claims = models::Claims {
            sub: "U_K7NP3X".to_string(),
            exp: 1234567890,
        };

        assert_eq!(claims.sub, "U_K7NP3X");
        assert_eq!(claims.exp, 1234567890);
    }

    #[test]
    fn test_session_token_encoding_and_decoding() {
        let secret = "test_secret_key";
        let claims = models::Claims {
            sub: "U_K7NP3X".to_string(),
            exp: 9999999999, // Far future
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let decoded = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("Failed to decode token");

        assert_eq!(decoded.claims.sub, "U_K7NP3X");
        assert_eq!(decoded.claims.exp, 9999999999);
    }

    #[test]
    fn test_session_token_fails_with_wrong_secret() {
        let secret = "test_secret_key";
        let wrong_secret = "wrong_secret_key";

        let claims = models::Claims {
            sub: "U_K7NP3X".to_string(),
            exp: 9999999999,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(wrong_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(
            result.is_err(),
            "Token validation should fail with wrong secret"
        );
    }

    #[test]
    fn test_expired_session_token_rejected() {
        let secret = "test_secret_key";
        let claims = models::Claims {
            sub: "U_K7NP3X".to_string(),
            exp: 1, // 1970, far beyond any leeway
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(result.is_err(), "Expired token should be rejected");
    }

    #[test]
    fn test_user_role_predicate() {
        let mut user = sample_user();
        assert!(!user.is_admin());

        user.role = "admin".to_string();
        assert!(user.is_admin());
    }

    #[test]
    fn test_user_response_wire_shape() {
        let json = serde_json::to_value(models::UserResponse::from(sample_user()))
            .expect("response should serialize");

        assert_eq!(json["googleId"], "108204");
        assert_eq!(json["name"], "Jan Kowalski");
        assert_eq!(json["email"], "jan@example.com");
        assert_eq!(json["picture"], "https://p.example/a.png");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_user_response_falls_back_to_internal_id() {
        let mut user = sample_user();
        user.google_id = None;

        let json = serde_json::to_value(models::UserResponse::from(user)).unwrap();
        assert_eq!(json["googleId"], "U_K7NP3X");
    }

    async fn test_state(secret: &str) -> Arc<RwLock<AppState>> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory database should open");
        migrations::run_migrations(&pool).await.expect("migrations should run");

        let http = Client::new();
        Arc::new(RwLock::new(AppState {
            db: pool,
            jwt_secret: secret.to_string(),
            admin_emails: HashSet::new(),
            frontend_url: "http://localhost:3000".to_string(),
            posts_per_page: 10,
            google_service: Arc::new(GoogleService::new(http.clone(), None, None)),
            identity_exchange: Arc::new(IdentityExchange::new(
                http,
                secret.to_string(),
                "http://localhost:9000/user/login".to_string(),
            )),
        }))
    }

    #[tokio::test]
    async fn test_login_accepts_assertion_without_subject() {
        // Assertions carry only name/email/picture; the account is created
        // with no provider subject id and the wire googleId falls back to
        // the internal id.
        let secret = "test_secret_key";
        let state = test_state(secret).await;

        let assertion = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({
                "name": "Jan Kowalski",
                "email": "jan@example.com",
                "picture": "https://p.example/a.png",
                "exp": 9999999999u64,
            }),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", assertion).parse().unwrap(),
        );

        let axum::Json(body) = handlers::user_login(Extension(state.clone()), headers)
            .await
            .expect("assertion without a subject claim should log in");

        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
        let internal_id = body["user"]["googleId"]
            .as_str()
            .expect("googleId should be present")
            .to_string();
        assert!(internal_id.starts_with("U_"));

        let pool = state.read().await.db.clone();
        let stored = sqlx::query_as::<_, models::User>("SELECT * FROM users WHERE email = ?")
            .bind("jan@example.com")
            .fetch_one(&pool)
            .await
            .expect("user row should exist after login");
        assert_eq!(stored.id, internal_id);
        assert_eq!(stored.google_id, None);
    }
}
