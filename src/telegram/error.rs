//! Telegram transport errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),
    #[error("bot API rejected the call: {0}")]
    Api(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs carry the bot token
        Self::Http(e.without_url())
    }
}
