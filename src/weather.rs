//! Weather provider adapters
//!
//! Provides forecasts for named locations via OpenWeatherMap. The runtime
//! only sees the [`ForecastProvider`] trait.

mod error;
mod openweather;

pub use error::LocationLookupError;
pub use openweather::{OpenWeatherClient, OPENWEATHER_API_URL};

use crate::forecast::ForecastSeries;
use crate::runtime::ForecastProvider;
use async_trait::async_trait;
use std::sync::Arc;

/// Logging wrapper for forecast providers
pub struct LoggingProvider {
    inner: Arc<dyn ForecastProvider>,
}

impl LoggingProvider {
    pub fn new(inner: Arc<dyn ForecastProvider>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ForecastProvider for LoggingProvider {
    async fn fetch_forecast(&self, location: &str) -> Result<ForecastSeries, LocationLookupError> {
        let start = std::time::Instant::now();
        let result = self.inner.fetch_forecast(location).await;
        let duration = start.elapsed();

        match &result {
            Ok(series) => {
                tracing::info!(
                    location = %location,
                    duration_ms = %duration.as_millis(),
                    samples = series.samples.len(),
                    "Forecast fetched"
                );
            }
            Err(e) => {
                tracing::warn!(
                    location = %location,
                    duration_ms = %duration.as_millis(),
                    error = %e,
                    "Forecast lookup failed"
                );
            }
        }

        result
    }
}
