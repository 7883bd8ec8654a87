// src/services/google.rs
//! Google OAuth client
//!
//! Builds the authorization URL, exchanges the authorization code for an
//! access token and fetches the signed-in user's profile.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Google OAuth not configured")]
    NotConfigured,

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub scope: Option<String>,
}

/// Profile fields returned by the userinfo endpoint.
///
/// `email` is optional on the wire; the identity exchange rejects profiles
/// without one before anything is persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleService {
    client: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl GoogleService {
    pub fn new(client: Client, client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self {
            client,
            client_id,
            client_secret,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), GoogleError> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(GoogleError::NotConfigured),
        }
    }

    /// Build the provider authorization URL the frontend redirects to.
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<String, GoogleError> {
        let (client_id, _) = self.credentials()?;

        let url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=online",
            AUTH_ENDPOINT,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode("openid email profile"),
        );

        debug!(redirect_uri = %redirect_uri, "Built Google authorization URL");
        Ok(url)
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, GoogleError> {
        let (client_id, client_secret) = self.credentials()?;

        let params = [
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP error contacting Google token endpoint");
                GoogleError::RequestFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(http_status = %status, body = %body, "Google token exchange refused");
            return Err(GoogleError::OAuthFailed(format!(
                "token endpoint returned {}",
                status
            )));
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Google token response");
            GoogleError::OAuthFailed("malformed token response".to_string())
        })
    }

    /// Fetch the signed-in user's profile with a fresh access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, GoogleError> {
        let response = self
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP error contacting Google userinfo endpoint");
                GoogleError::RequestFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(http_status = %status, "Google userinfo request refused");
            return Err(GoogleError::OAuthFailed(format!(
                "userinfo endpoint returned {}",
                status
            )));
        }

        response.json::<GoogleProfile>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Google userinfo response");
            GoogleError::OAuthFailed("malformed userinfo response".to_string())
        })
    }
}
