//! Authentication handlers

use axum::{
    extract::{Extension, Query},
    http::{header::AUTHORIZATION, HeaderMap},
    response::Redirect,
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::extractors::AuthedUser;
use super::models::{Claims, User, UserResponse};
use crate::common::{generate_user_id, safe_email_log, ApiError, AppState};
use crate::services::identity::{AssertionClaims, IdentityError};

/// Lifetime of the session token issued on login.
const SESSION_TTL_HOURS: i64 = 24;

/// GET /login
/// Returns the provider authorization URL the frontend redirects to.
///
/// # Response
/// ```json
/// { "url": "https://accounts.google.com/o/oauth2/v2/auth?..." }
/// ```
pub async fn login_url(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let redirect_uri = std::env::var("GOOGLE_OAUTH_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:9000/oauth/callback".to_string());

    let url = state
        .google_service
        .authorization_url(&redirect_uri)
        .map_err(|e| {
            error!(error = %e, "Failed to build authorization URL");
            ApiError::InternalServer("login is not configured".to_string())
        })?;

    debug!(redirect_uri = %redirect_uri, "Login URL issued");

    Ok(Json(serde_json::json!({ "url": url })))
}

/// GET /oauth/callback
/// Completes the provider flow: exchanges the authorization code, fetches the
/// profile, runs the identity exchange against the login endpoint and sends
/// the browser back to the frontend with the session token.
pub async fn oauth_callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();

    if let Some(provider_error) = params.get("error") {
        warn!(oauth_error = %provider_error, "Provider returned an error on callback");
        return Err(ApiError::Unauthorized("authorization failed".to_string()));
    }

    let code = params.get("code").ok_or_else(|| {
        warn!("OAuth callback missing authorization code");
        ApiError::BadRequest("no authorization code provided".to_string())
    })?;

    let redirect_uri = std::env::var("GOOGLE_OAUTH_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:9000/oauth/callback".to_string());

    let tokens = state
        .google_service
        .exchange_code(code, &redirect_uri)
        .await
        .map_err(|e| {
            error!(error = %e, "Authorization code exchange failed");
            ApiError::Unauthorized("authorization code exchange failed".to_string())
        })?;

    let profile = state
        .google_service
        .fetch_profile(&tokens.access_token)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch provider profile");
            ApiError::Unauthorized("could not fetch user profile".to_string())
        })?;

    let login = state
        .identity_exchange
        .login(&profile)
        .await
        .map_err(|e| match e {
            IdentityError::MissingEmail => {
                ApiError::Unauthorized("provider returned no email".to_string())
            }
            IdentityError::LoginRefused(status) => {
                warn!(http_status = status, "Login refused by backend");
                ApiError::Unauthorized("login refused".to_string())
            }
            other => {
                error!(error = %other, "Identity exchange failed");
                ApiError::InternalServer("identity exchange failed".to_string())
            }
        })?;

    let target = format!(
        "{}/auth/login?token={}",
        state.frontend_url.trim_end_matches('/'),
        urlencoding::encode(&login.token)
    );

    Ok(Redirect::to(&target))
}

/// POST /user/login
/// Validates the bearer login assertion, creates the user on first login and
/// issues a session token.
///
/// # Response
/// ```json
/// {
///   "token": "<session jwt>",
///   "user": { "googleId": "...", "name": "...", "email": "...", "picture": "...", "role": "user" }
/// }
/// ```
pub async fn user_login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let assertion = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            warn!("Login attempt without bearer assertion");
            ApiError::Unauthorized("missing login assertion".to_string())
        })?;

    // The assertion is signed with the shared secret and lives 10 minutes;
    // expiry is enforced here by validation.
    let decoded = decode::<AssertionClaims>(
        assertion,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        warn!(error = %e, "Login assertion validation failed");
        ApiError::Unauthorized("invalid login assertion".to_string())
    })?;

    let claims = decoded.claims;
    let email = claims.email.trim().to_lowercase();
    if email.is_empty() {
        warn!("Login assertion carries an empty email");
        return Err(ApiError::Unauthorized(
            "assertion missing email".to_string(),
        ));
    }

    let role = if state.admin_emails.contains(&email) {
        "admin"
    } else {
        "user"
    };

    let user = upsert_user(&state.db, &claims, &email, role).await?;

    let exp = (Utc::now() + Duration::hours(SESSION_TTL_HOURS)).timestamp() as usize;
    let session_claims = Claims {
        sub: user.id.clone(),
        exp,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &session_claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user.id, "Session token encoding failed");
        ApiError::InternalServer("jwt error".to_string())
    })?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        role = %user.role,
        "User login successful"
    );

    let resp = serde_json::json!({
        "token": token,
        "user": UserResponse::from(user),
    });

    Ok(Json(resp))
}

/// GET /user/me
/// Returns the current authenticated user.
#[axum::debug_handler]
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(user.into()))
}

/// GET /oauth/logout
/// Sessions are stateless JWTs, so logout is confirmed here and the client
/// discards its token.
pub async fn logout_handler(authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    info!(user_id = %authed.id, "User logout successful");
    let resp = serde_json::json!({
        "message": "Logout successful"
    });
    Ok(Json(resp))
}

/// Create or refresh the user row for a validated assertion.
///
/// Users are keyed by email; name, picture, subject id and role are refreshed
/// on every login so the admin list change takes effect at the next sign-in.
async fn upsert_user(
    pool: &SqlitePool,
    claims: &AssertionClaims,
    email: &str,
    role: &str,
) -> Result<User, ApiError> {
    let existing: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                email = %safe_email_log(email),
                "Database error checking existing user during login"
            );
            ApiError::DatabaseError(e)
        })?;

    let user_id = match existing {
        Some(u) => {
            sqlx::query(
                "UPDATE users SET google_id = ?, name = ?, picture = ?, role = ? WHERE id = ?",
            )
            .bind(claims.sub.as_deref())
            .bind(claims.name.as_deref())
            .bind(claims.picture.as_deref())
            .bind(role)
            .bind(&u.id)
            .execute(pool)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %u.id, "Database error refreshing user on login");
                ApiError::DatabaseError(e)
            })?;
            u.id
        }
        None => {
            let id = generate_user_id();
            info!(
                user_id = %id,
                email = %safe_email_log(email),
                role = %role,
                "Creating new user account on first login"
            );
            sqlx::query(
                r#"
                INSERT INTO users (id, google_id, email, name, picture, role, created_at)
                VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
                "#,
            )
            .bind(&id)
            .bind(claims.sub.as_deref())
            .bind(email)
            .bind(claims.name.as_deref())
            .bind(claims.picture.as_deref())
            .bind(role)
            .execute(pool)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    user_id = %id,
                    email = %safe_email_log(email),
                    "Database error inserting new user during login"
                );
                ApiError::DatabaseError(e)
            })?;
            id
        }
    };

    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "Database error fetching user after login");
            ApiError::DatabaseError(e)
        })
}
