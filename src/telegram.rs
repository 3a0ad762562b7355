//! Telegram Bot API transport
//!
//! Long-polls `getUpdates` for inbound text and delivers replies with
//! `sendMessage`. Plain JSON over HTTPS; no webhook support.

mod error;
mod types;

pub use error::TransportError;
pub use types::Update;

use crate::runtime::{ForecastProvider, ReplySink, RuntimeManager};
use crate::session::ChatId;
use crate::state_machine::Reply;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use types::{ApiResponse, GetUpdatesRequest, ReplyKeyboardMarkup, SendMessageRequest};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Pause after a failed poll before trying again
pub const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Slack on top of the long-poll timeout for the HTTP request itself
const REQUEST_GRACE: Duration = Duration::from_secs(10);

const ALLOWED_UPDATES: &[&str] = &["message"];

/// `sendMessage` text limit, counted in UTF-16 code units
pub const MAX_MESSAGE_LEN: usize = 4096;

pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(
        token: impl Into<String>,
        base_url: impl Into<String>,
        poll_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(poll_timeout + REQUEST_GRACE)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            poll_timeout,
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned + Send,
    {
        let url = format!("{}/bot{}/{method}", self.base_url, self.token);
        let response = self.client.post(&url).json(body).send().await?;

        // Bot API reports failures in the envelope, often alongside a 4xx status
        let envelope: ApiResponse<T> = response.json().await?;
        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(TransportError::Api(
                description.unwrap_or_else(|| format!("{method} failed without description")),
            )),
        }
    }

    /// Updates after `offset`, waiting up to the poll timeout for new ones
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TransportError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &request).await
    }

    /// Send a reply, split into several messages if it is over the length
    /// limit. The keyboard goes with the last part.
    pub async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<(), TransportError> {
        let chunks = split_message(&reply.text, MAX_MESSAGE_LEN);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            let request = SendMessageRequest {
                chat_id: chat.0,
                text: chunk,
                reply_markup: if i == last {
                    reply.keyboard.map(ReplyKeyboardMarkup::from)
                } else {
                    None
                },
            };
            let _: serde_json::Value = self.call("sendMessage", &request).await?;
        }
        Ok(())
    }
}

/// Break `text` into pieces of at most `limit` UTF-16 units, preferring
/// line boundaries. Lines longer than the limit are cut between characters.
fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.encode_utf16().count();
        let separator = usize::from(!current.is_empty());

        if current_len + separator + line_len <= limit {
            if separator == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += separator + line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
            continue;
        }

        for c in line.chars() {
            let width = c.len_utf16();
            if current_len + width > limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push(c);
            current_len += width;
        }
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl ReplySink for TelegramClient {
    async fn send_reply(&self, chat: ChatId, reply: &Reply) -> Result<(), TransportError> {
        self.send_message(chat, reply).await
    }
}

/// Feed updates into the runtime until `shutdown` resolves
pub async fn run_polling<P, R>(
    client: &TelegramClient,
    manager: &RuntimeManager<P, R>,
    retry_delay: Duration,
    shutdown: impl Future<Output = ()>,
) where
    P: ForecastProvider + 'static,
    R: ReplySink + 'static,
{
    tokio::pin!(shutdown);
    let mut offset: Option<i64> = None;

    tracing::info!("Polling for updates");

    loop {
        let polled = tokio::select! {
            () = &mut shutdown => break,
            polled = client.get_updates(offset) => polled,
        };

        match polled {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    let update_id = update.update_id;
                    match update.into_inbound() {
                        Some(message) => manager.dispatch(message).await,
                        None => tracing::debug!(update_id, "Skipping non-text update"),
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, retry_in_ms = %retry_delay.as_millis(), "getUpdates failed");
                tokio::select! {
                    () = &mut shutdown => break,
                    () = tokio::time::sleep(retry_delay) => {}
                }
            }
        }
    }

    tracing::info!("Polling stopped");
}
