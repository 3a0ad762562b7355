//! Mock implementations for testing
//!
//! These mocks enable runtime tests without real I/O.

use super::traits::{ForecastProvider, ReplySink};
use crate::forecast::{ForecastSeries, Sample};
use crate::session::{canonical_location, ChatId};
use crate::state_machine::Reply;
use crate::telegram::TransportError;
use crate::weather::LocationLookupError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Forecast Provider
// ============================================================================

/// Provider that knows a fixed set of locations (matched ignoring case)
#[allow(dead_code)]
pub struct MockProvider {
    series: HashMap<String, Vec<Sample>>,
    delay: Option<Duration>,
    /// Locations requested, in call order
    pub calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_location(mut self, name: &str, samples: Vec<Sample>) -> Self {
        self.series.insert(canonical_location(name), samples);
        self
    }

    /// Every lookup sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of lookups that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForecastProvider for MockProvider {
    async fn fetch_forecast(&self, location: &str) -> Result<ForecastSeries, LocationLookupError> {
        self.calls.lock().unwrap().push(location.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.series
            .get(&canonical_location(location))
            .map(|samples| ForecastSeries {
                samples: samples.clone(),
            })
            .ok_or_else(|| LocationLookupError::NotFound(location.to_string()))
    }
}

// ============================================================================
// Recording Reply Sink
// ============================================================================

/// Sink that records every reply it is asked to send
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(ChatId, Reply)>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<(ChatId, Reply)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.replies().into_iter().map(|(_, r)| r.text).collect()
    }

    pub fn last(&self) -> Option<Reply> {
        self.sent.lock().unwrap().last().map(|(_, r)| r.clone())
    }

    /// Poll until at least `count` replies were sent, or panic after a few seconds
    pub async fn wait_for(&self, count: usize) {
        self.wait_until(|sent| sent.len() >= count).await;
    }

    /// Poll until `done` holds for the replies sent so far, or panic after a few seconds
    pub async fn wait_until(&self, done: impl Fn(&[(ChatId, Reply)]) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !done(&self.replies()) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for replies, got {:?}",
                self.texts()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send_reply(&self, chat: ChatId, reply: &Reply) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push((chat, reply.clone()));
        Ok(())
    }
}

/// Sink whose every send fails
pub struct FailingSink;

#[async_trait]
impl ReplySink for FailingSink {
    async fn send_reply(&self, _chat: ChatId, _reply: &Reply) -> Result<(), TransportError> {
        Err(TransportError::Api("chat not found".to_string()))
    }
}
