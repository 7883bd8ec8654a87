// src/services/identity.rs
//! Identity exchange
//!
//! Turns a provider profile into an established session: mints a short-lived
//! signed assertion carrying name/email/picture and presents it as a bearer
//! credential to the login endpoint. A profile without an email is rejected
//! before any network call is made.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::google::GoogleProfile;
use crate::common::{safe_email_log, safe_token_log};

/// Lifetime of the login assertion.
const ASSERTION_TTL_MINUTES: i64 = 10;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("provider returned no email")]
    MissingEmail,

    #[error("assertion signing failed: {0}")]
    SigningFailed(String),

    #[error("login endpoint refused the assertion ({0})")]
    LoginRefused(u16),

    #[error("login endpoint unreachable: {0}")]
    LoginUnreachable(String),

    #[error("malformed login response: {0}")]
    MalformedResponse(String),
}

/// Claims carried by the login assertion.
///
/// The contract requires only name/email/picture; the provider subject id
/// is recorded when the profile carries one.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: usize,
}

/// Body returned by the login endpoint on success. The endpoint also
/// returns the user record, but only the session token is consumed here.
#[derive(Debug, Deserialize)]
pub struct LoginResult {
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct IdentityExchange {
    client: Client,
    signing_secret: String,
    login_endpoint: String,
}

impl IdentityExchange {
    pub fn new(client: Client, signing_secret: String, login_endpoint: String) -> Self {
        Self {
            client,
            signing_secret,
            login_endpoint,
        }
    }

    /// Mint the 10-minute assertion for a provider profile.
    ///
    /// Fails with `MissingEmail` without touching the network when the
    /// provider did not assert an email address.
    pub fn mint_assertion(&self, profile: &GoogleProfile) -> Result<String, IdentityError> {
        let email = profile.email.as_deref().ok_or_else(|| {
            warn!(provider_sub = %profile.sub, "Provider profile carries no email, rejecting sign-in");
            IdentityError::MissingEmail
        })?;

        let exp = (Utc::now() + Duration::minutes(ASSERTION_TTL_MINUTES)).timestamp() as usize;
        let claims = AssertionClaims {
            sub: Some(profile.sub.clone()),
            email: email.to_string(),
            name: profile.name.clone(),
            picture: profile.picture.clone(),
            exp,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.signing_secret.as_bytes()),
        )
        .map_err(|e| {
            error!(error = %e, "Failed to sign login assertion");
            IdentityError::SigningFailed(e.to_string())
        })
    }

    /// Present the assertion to the login endpoint and return the session.
    pub async fn login(&self, profile: &GoogleProfile) -> Result<LoginResult, IdentityError> {
        let assertion = self.mint_assertion(profile)?;

        debug!(
            login_endpoint = %self.login_endpoint,
            assertion = %safe_token_log(&assertion),
            "Presenting login assertion"
        );

        let response = self
            .client
            .post(&self.login_endpoint)
            .bearer_auth(&assertion)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    login_endpoint = %self.login_endpoint,
                    "HTTP error contacting login endpoint"
                );
                IdentityError::LoginUnreachable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                http_status = %status,
                login_endpoint = %self.login_endpoint,
                "Login refused by backend"
            );
            return Err(IdentityError::LoginRefused(status.as_u16()));
        }

        let result = response.json::<LoginResult>().await.map_err(|e| {
            error!(error = %e, "Failed to parse login endpoint response");
            IdentityError::MalformedResponse(e.to_string())
        })?;

        if let Some(email) = profile.email.as_deref() {
            info!(
                email = %safe_email_log(email),
                "Identity exchange completed, session established"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn profile(email: Option<&str>) -> GoogleProfile {
        GoogleProfile {
            sub: "108".to_string(),
            name: Some("Jan Kowalski".to_string()),
            email: email.map(str::to_string),
            picture: Some("https://p.example/a.png".to_string()),
        }
    }

    fn exchange(secret: &str) -> IdentityExchange {
        IdentityExchange::new(
            Client::new(),
            secret.to_string(),
            "http://localhost:9000/user/login".to_string(),
        )
    }

    #[test]
    fn test_assertion_carries_profile_claims() {
        let secret = "test_signing_secret";
        let assertion = exchange(secret)
            .mint_assertion(&profile(Some("jan@example.com")))
            .expect("profile with email should mint");

        let decoded = decode::<AssertionClaims>(
            &assertion,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("assertion should validate against the signing secret");

        assert_eq!(decoded.claims.sub, Some("108".to_string()));
        assert_eq!(decoded.claims.email, "jan@example.com");
        assert_eq!(decoded.claims.name, Some("Jan Kowalski".to_string()));
    }

    #[test]
    fn test_assertion_without_sub_is_accepted() {
        // Assertions minted by other clients carry only name/email/picture.
        let secret = "test_signing_secret";
        let token = encode(
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

        let decoded = decode::<AssertionClaims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("assertion without a subject claim should validate");

        assert_eq!(decoded.claims.sub, None);
        assert_eq!(decoded.claims.email, "jan@example.com");
    }

    #[test]
    fn test_assertion_expiry_is_ten_minutes() {
        let secret = "test_signing_secret";
        let assertion = exchange(secret)
            .mint_assertion(&profile(Some("jan@example.com")))
            .unwrap();

        let decoded = decode::<AssertionClaims>(
            &assertion,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();

        let ttl = decoded.claims.exp as i64 - Utc::now().timestamp();
        assert!(ttl > 9 * 60, "assertion expired too early: {}s", ttl);
        assert!(ttl <= 10 * 60, "assertion lives too long: {}s", ttl);
    }

    #[test]
    fn test_missing_email_rejected_before_network() {
        let result = exchange("secret").mint_assertion(&profile(None));
        assert!(matches!(result, Err(IdentityError::MissingEmail)));
    }

    #[test]
    fn test_assertion_rejected_with_wrong_secret() {
        let assertion = exchange("right_secret")
            .mint_assertion(&profile(Some("jan@example.com")))
            .unwrap();

        let result = decode::<AssertionClaims>(
            &assertion,
            &DecodingKey::from_secret(b"wrong_secret"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }
}
