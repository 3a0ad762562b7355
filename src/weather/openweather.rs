//! OpenWeatherMap 5 day / 3 hour forecast client

use super::LocationLookupError;
use crate::forecast::{ForecastSeries, Sample};
use crate::runtime::ForecastProvider;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const OPENWEATHER_API_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    #[serde(default)]
    main: Option<MainBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    #[serde(default)]
    temp: Option<f64>,
}

impl From<ForecastEntry> for Sample {
    fn from(entry: ForecastEntry) -> Self {
        Sample {
            timestamp: entry.dt,
            temperature: entry.main.and_then(|m| m.temp),
        }
    }
}

/// Metric-unit forecast lookups by location name
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LocationLookupError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    fn forecast_url(&self) -> String {
        format!("{}/data/2.5/forecast", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherClient {
    async fn fetch_forecast(&self, location: &str) -> Result<ForecastSeries, LocationLookupError> {
        let response = self
            .client
            .get(self.forecast_url())
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LocationLookupError::NotFound(location.to_string()));
        }
        if !status.is_success() {
            return Err(LocationLookupError::Status(status.as_u16()));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| LocationLookupError::Decode(e.to_string()))?;

        if body.list.is_empty() {
            return Err(LocationLookupError::Empty(location.to_string()));
        }

        let mut samples: Vec<Sample> = body.list.into_iter().map(Sample::from).collect();
        samples.sort_by_key(|s| s.timestamp);

        Ok(ForecastSeries { samples })
    }
}
