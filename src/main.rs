//! Forecast bot - Telegram weather digests
//!
//! Users track a list of locations and ask for a compact multi-day digest
//! of average morning/day/evening temperatures for each of them.

mod config;
mod forecast;
mod runtime;
mod session;
mod state_machine;
mod telegram;
mod weather;

use config::BotConfig;
use runtime::{ProductionRuntime, RuntimeSettings};
use session::SessionStore;
use std::sync::Arc;
use telegram::{run_polling, TelegramClient, POLL_RETRY_DELAY};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather::{LoggingProvider, OpenWeatherClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;
    tracing::info!(
        telegram_api = %config.telegram_api_url,
        weather_api = %config.openweather_base_url,
        utc_offset_secs = config.zone.local_minus_utc(),
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        "Configuration loaded"
    );

    let weather = OpenWeatherClient::new(
        config.openweather_api_key.clone(),
        config.openweather_base_url.clone(),
        config.fetch_timeout,
    )?;
    let provider = Arc::new(LoggingProvider::new(Arc::new(weather)));

    let telegram = Arc::new(TelegramClient::new(
        config.telegram_token.clone(),
        config.telegram_api_url.clone(),
        config.poll_timeout,
    )?);

    let manager: ProductionRuntime = ProductionRuntime::new(
        Arc::new(SessionStore::new()),
        provider,
        telegram.clone(),
        RuntimeSettings {
            zone: config.zone,
            fetch_timeout: config.fetch_timeout,
        },
    );

    run_polling(&telegram, &manager, POLL_RETRY_DELAY, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    })
    .await;

    tracing::info!(
        users = manager.store().user_count().await,
        "Server shutting down"
    );
    Ok(())
}
