//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Session token claims. `sub` is the internal user id.
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub google_id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub role: String,
    pub created_at: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// User as served to clients. Field names follow the frontend contract.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub google_id: String,
    pub name: Option<String>,
    pub email: String,
    pub picture: Option<String>,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        // Users created before the provider subject was recorded fall back
        // to the internal id so the client always has a stable key.
        let google_id = user.google_id.unwrap_or_else(|| user.id.clone());
        UserResponse {
            google_id,
            name: user.name,
            email: user.email,
            picture: user.picture,
            role: user.role,
        }
    }
}
