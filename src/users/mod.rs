// src/users/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use models::*;
pub use routes::users_routes;
