// Services module - outbound integrations

pub mod google;
pub mod identity;

pub use google::GoogleService;
pub use identity::IdentityExchange;
