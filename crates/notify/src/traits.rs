//! Notifier trait definition and shared error types.

use rota_core::ChatId;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Trait for notification channel implementations.
///
/// Callers treat delivery as best-effort: a failed send is logged and
/// swallowed after a single attempt, never retried for the same event.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to the given chat.
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "telegram").
    fn channel_name(&self) -> &str;
}
