//! Process configuration read from the environment

use crate::telegram::TELEGRAM_API_URL;
use crate::weather::OPENWEATHER_API_URL;
use chrono::FixedOffset;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value \"{value}\": {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub openweather_api_key: String,
    pub telegram_api_url: String,
    pub openweather_base_url: String,
    /// Reference zone for day and period boundaries
    pub zone: FixedOffset,
    pub fetch_timeout: Duration,
    pub poll_timeout: Duration,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &"<redacted>")
            .field("openweather_api_key", &"<redacted>")
            .field("telegram_api_url", &self.telegram_api_url)
            .field("openweather_base_url", &self.openweather_base_url)
            .field("zone", &self.zone)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let offset_hours = match get("FORECAST_UTC_OFFSET_HOURS") {
            Some(raw) => parse_offset_hours(&raw)?,
            None => DEFAULT_UTC_OFFSET_HOURS,
        };
        let zone = FixedOffset::east_opt(offset_hours * 3600).ok_or(ConfigError::Invalid {
            name: "FORECAST_UTC_OFFSET_HOURS",
            value: offset_hours.to_string(),
            reason: "not a valid UTC offset",
        })?;

        let fetch_timeout = match get("FETCH_TIMEOUT_SECS") {
            Some(raw) => parse_secs("FETCH_TIMEOUT_SECS", &raw, false)?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };
        let poll_timeout = match get("TELEGRAM_POLL_TIMEOUT_SECS") {
            Some(raw) => parse_secs("TELEGRAM_POLL_TIMEOUT_SECS", &raw, true)?,
            None => DEFAULT_POLL_TIMEOUT_SECS,
        };

        Ok(Self {
            telegram_token: require("TELEGRAM_BOT_TOKEN")?,
            openweather_api_key: require("OPENWEATHER_API_KEY")?,
            telegram_api_url: get("TELEGRAM_API_URL")
                .unwrap_or_else(|| TELEGRAM_API_URL.to_string()),
            openweather_base_url: get("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|| OPENWEATHER_API_URL.to_string()),
            zone,
            fetch_timeout: Duration::from_secs(fetch_timeout),
            poll_timeout: Duration::from_secs(poll_timeout),
        })
    }
}

fn parse_offset_hours(raw: &str) -> Result<i32, ConfigError> {
    let invalid = |reason| ConfigError::Invalid {
        name: "FORECAST_UTC_OFFSET_HOURS",
        value: raw.to_string(),
        reason,
    };
    let hours: i32 = raw
        .trim_start_matches('+')
        .parse()
        .map_err(|_| invalid("expected whole hours"))?;
    if (-12..=14).contains(&hours) {
        Ok(hours)
    } else {
        Err(invalid("must be between -12 and 14"))
    }
}

fn parse_secs(name: &'static str, raw: &str, allow_zero: bool) -> Result<u64, ConfigError> {
    let invalid = |reason| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason,
    };
    let secs: u64 = raw.parse().map_err(|_| invalid("expected whole seconds"))?;
    if secs == 0 && !allow_zero {
        return Err(invalid("must be greater than zero"));
    }
    Ok(secs)
}
