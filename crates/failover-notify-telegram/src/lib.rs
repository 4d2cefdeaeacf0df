// # Telegram Notifier
//
// Sends failover alerts as Telegram bot messages to one fixed chat.
//
// - ✅ One HTTP request per message, 10 second timeout
// - ✅ Bot token NEVER appears in logs or Debug output
// - ❌ NO retries: alerts are best-effort and the engine swallows failures
//
// ## API Reference
//
// - Bot API: https://core.telegram.org/bots/api#sendmessage
// - Send Message: POST `/bot<token>/sendMessage` with `{chat_id, text}`

use async_trait::async_trait;
use failover_core::config::NotifierConfig;
use failover_core::traits::Notifier;
use failover_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Timeout for a single sendMessage call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram bot notifier
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the bot token.
pub struct TelegramNotifier {
    /// Bot token
    /// ⚠️ NEVER log this value
    bot_token: String,

    /// Destination chat
    chat_id: String,

    /// API root, overridable for tests
    api_base: String,

    client: reqwest::Client,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("bot_token", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramNotifier {
    /// Create a notifier
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either credential is empty or the
    /// HTTP client cannot be built.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();

        if bot_token.is_empty() || chat_id.is_empty() {
            return Err(Error::config("Telegram bot token and chat ID are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bot_token,
            chat_id,
            api_base: TELEGRAM_API_BASE.to_string(),
            client,
        })
    }

    /// Build from configuration
    ///
    /// Returns `Ok(None)` when notifications are disabled.
    pub fn from_config(config: &NotifierConfig) -> Result<Option<Self>> {
        match config {
            NotifierConfig::Telegram { bot_token, chat_id } => {
                Self::new(bot_token.clone(), chat_id.clone()).map(Some)
            }
            NotifierConfig::Disabled => Ok(None),
        }
    }

    /// Point the notifier at a different API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
        };

        // reqwest errors can embed the URL, which carries the token.
        let response = self
            .client
            .post(self.send_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::notifier(format!("sendMessage failed: {}", e.without_url())))?;

        let status = response.status();
        let reply: Option<ApiResponse> = response.json().await.ok();

        if !status.is_success() {
            let description = reply
                .and_then(|r| r.description)
                .unwrap_or_else(|| "no description".to_string());
            return Err(match status.as_u16() {
                401 | 403 => Error::auth(format!("Telegram rejected the bot token: {}", description)),
                429 => Error::rate_limited(format!("Telegram rate limit: {}", description)),
                _ => Error::notifier(format!("sendMessage returned {}: {}", status, description)),
            });
        }

        match reply {
            Some(reply) if !reply.ok => Err(Error::notifier(format!(
                "sendMessage not ok: {}",
                reply.description.unwrap_or_default()
            ))),
            _ => {
                tracing::debug!("Telegram message sent to chat {}", self.chat_id);
                Ok(())
            }
        }
    }

    fn notifier_name(&self) -> &'static str {
        "telegram"
    }
}
