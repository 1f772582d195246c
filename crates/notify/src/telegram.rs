//! Telegram Bot API notifier with HTML formatting.
//!
//! Delivers messages via the Telegram Bot API `sendMessage` endpoint.
//! Supports HTML parse mode (used for `tg://user?id=` mention links) and
//! rate limit handling.

use rota_core::ChatId;

use crate::traits::{Notifier, NotifyError};

/// Escapes the characters Telegram requires escaped in HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Renders a clickable user mention link for HTML parse mode.
pub fn mention(user_id: i64, display_name: &str) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user_id,
        escape_html(display_name)
    )
}

/// Sends messages via the Telegram Bot API.
#[derive(Debug)]
pub struct TelegramNotifier {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Creates a new `TelegramNotifier`.
    ///
    /// Returns [`NotifyError::Config`] if the token is empty.
    pub fn new(
        bot_token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let bot_token = bot_token.into();
        if bot_token.is_empty() {
            return Err(NotifyError::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }
        Ok(Self {
            bot_token,
            api_base: api_base.into(),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    /// Sends a message via the Telegram `sendMessage` API.
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);

        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        tracing::debug!(chat_id, "Sending Telegram message");

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        let resp_body: serde_json::Value = response.json().await?;

        if resp_body.get("ok") == Some(&serde_json::Value::Bool(true)) {
            tracing::debug!(chat_id, "Telegram message sent");
            return Ok(());
        }

        // Handle rate limiting (HTTP 429).
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp_body
                .get("parameters")
                .and_then(|p| p.get("retry_after"))
                .and_then(|v| v.as_u64())
                .unwrap_or(30);
            return Err(NotifyError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let description = resp_body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Telegram API error");

        Err(NotifyError::Config(format!(
            "Telegram API error: {description}"
        )))
    }

    /// Returns the channel name for this notifier.
    fn channel_name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_special_chars() {
        assert_eq!(
            escape_html("Bob <dev> & Alice"),
            "Bob &lt;dev&gt; &amp; Alice"
        );
    }

    #[test]
    fn test_escape_html_no_special_chars() {
        assert_eq!(escape_html("Hello World 123"), "Hello World 123");
    }

    #[test]
    fn test_mention_escapes_display_name() {
        assert_eq!(
            mention(42, "A <b>"),
            "<a href=\"tg://user?id=42\">A &lt;b&gt;</a>"
        );
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = TelegramNotifier::new("", "https://api.telegram.org");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("must not be empty"));
    }

    #[test]
    fn test_literal_token_accepted() {
        let notifier =
            TelegramNotifier::new("123456:ABC-DEF", "https://api.telegram.org").unwrap();
        assert_eq!(notifier.bot_token, "123456:ABC-DEF");
        assert_eq!(notifier.channel_name(), "telegram");
    }
}
