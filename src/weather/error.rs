//! Weather provider error types

use std::time::Duration;
use thiserror::Error;

/// Any failure to obtain a forecast for a location.
///
/// The conversation layer treats every variant the same way; the variants
/// exist for logs.
#[derive(Debug, Error)]
pub enum LocationLookupError {
    #[error("location \"{0}\" not found")]
    NotFound(String),
    #[error("request failed: {0}")]
    Http(reqwest::Error),
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed provider response: {0}")]
    Decode(String),
    #[error("provider returned no samples for \"{0}\"")]
    Empty(String),
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for LocationLookupError {
    fn from(e: reqwest::Error) -> Self {
        // The query string carries the API key
        Self::Http(e.without_url())
    }
}

impl LocationLookupError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}
