// src/auth/mod.rs

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use extractors::AuthedUser;
pub use models::{Claims, User, UserResponse};
pub use routes::auth_routes;
