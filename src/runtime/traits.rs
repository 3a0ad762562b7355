//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::forecast::ForecastSeries;
use crate::session::ChatId;
use crate::state_machine::Reply;
use crate::telegram::TransportError;
use crate::weather::LocationLookupError;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of forecasts for named locations
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch a non-empty, time-ordered series for `location`
    async fn fetch_forecast(&self, location: &str) -> Result<ForecastSeries, LocationLookupError>;
}

/// Outbound side of the chat transport
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_reply(&self, chat: ChatId, reply: &Reply) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ForecastProvider + ?Sized> ForecastProvider for Arc<T> {
    async fn fetch_forecast(&self, location: &str) -> Result<ForecastSeries, LocationLookupError> {
        (**self).fetch_forecast(location).await
    }
}

#[async_trait]
impl<T: ReplySink + ?Sized> ReplySink for Arc<T> {
    async fn send_reply(&self, chat: ChatId, reply: &Reply) -> Result<(), TransportError> {
        (**self).send_reply(chat, reply).await
    }
}
