// Application state shared across all modules

use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

use crate::services::{GoogleService, IdentityExchange};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Signing secret shared by the login assertion and the session token.
    pub jwt_secret: String,
    pub admin_emails: HashSet<String>,
    pub frontend_url: String,
    pub posts_per_page: usize,
    pub google_service: Arc<GoogleService>,
    pub identity_exchange: Arc<IdentityExchange>,
}
