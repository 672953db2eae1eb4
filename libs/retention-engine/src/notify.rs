use serde::Deserialize;

use crate::BoxFuture;
use crate::config::TelegramSettings;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Banner line prepended to failure alerts.
const ALERT_BANNER: &str = "💩Error💩";

/// Fire-and-forget alert channel. Never fails the caller.
pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()>;
}

/// Text sent for a failure.
pub fn alert_text(message: &str) -> String {
    format!("{ALERT_BANNER}\n{message}")
}

/// Log a failure and forward it to the notifier.
pub async fn report_failure(notifier: &dyn Notifier, message: &str) {
    tracing::error!("{message}");
    notifier.notify(&alert_text(message)).await;
}

// ═══════════════════════════════════════════════════════════════
//  NoopNotifier
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify<'a>(&'a self, _message: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}

// ═══════════════════════════════════════════════════════════════
//  TelegramNotifier
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
enum NotifyError {
    #[error("failed to send Telegram message: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Telegram API returned non-OK status: {status}{}", description_suffix(.description))]
    Status {
        status: reqwest::StatusCode,
        description: Option<String>,
    },
}

fn description_suffix(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

/// Error body of the Bot API (`{"ok":false,"description":"..."}`).
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    description: Option<String>,
}

/// Sends alerts through the Telegram Bot API `sendMessage` method.
///
/// Without both a token and a chat id every call is a logged no-op.
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base: String,
    settings: TelegramSettings,
}

impl TelegramNotifier {
    pub fn new(settings: TelegramSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: TELEGRAM_API_BASE.to_string(),
            settings,
        }
    }

    /// Point at a different Bot API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.settings.token)
    }

    /// Mask the token in the `/bot<token>/` URL segment.
    fn redact(&self, text: &str) -> String {
        text.replace(&format!("/bot{}/", self.settings.token), "/bot***/")
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.send_message_url())
            .form(&[
                ("chat_id", self.settings.chat_id.as_str()),
                ("text", message),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let description = serde_json::from_str::<ApiResponse>(&body)
            .ok()
            .and_then(|r| r.description);
        Err(NotifyError::Status {
            status,
            description,
        })
    }
}

impl Notifier for TelegramNotifier {
    fn notify<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if !self.settings.is_enabled() {
                tracing::info!("Telegram token or chat ID is not set, skipping Telegram notification");
                return;
            }
            match self.send(message).await {
                Ok(()) => tracing::info!("error notification sent to Telegram"),
                // The token is part of the URL; keep it out of the log.
                Err(e) => tracing::warn!("{}", self.redact(&e.to_string())),
            }
        })
    }
}
