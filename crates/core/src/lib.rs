pub mod config;
pub mod error;

pub use config::Config;
pub use error::RotaError;

/// Telegram user identifier.
pub type UserId = i64;

/// Telegram chat identifier (the notification destination).
pub type ChatId = i64;
