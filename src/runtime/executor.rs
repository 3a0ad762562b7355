//! Per-user runtime executor

use super::traits::{ForecastProvider, ReplySink};
use super::{Inboxes, InboundMessage, RuntimeSettings};
use crate::forecast::{render_forecast, ForecastSeries};
use crate::session::{ChatId, ConversationStage, SessionStore, UserId};
use crate::state_machine::{
    transition, Effect, Event, LocationForecast, LookupOutcome, TransitionError,
};
use crate::weather::LocationLookupError;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Drains one user's inbox, one message at a time
pub struct UserRuntime<P, R>
where
    P: ForecastProvider + 'static,
    R: ReplySink + 'static,
{
    user: UserId,
    store: Arc<SessionStore>,
    provider: Arc<P>,
    sink: Arc<R>,
    settings: RuntimeSettings,
}

impl<P, R> UserRuntime<P, R>
where
    P: ForecastProvider + 'static,
    R: ReplySink + 'static,
{
    pub fn new(
        user: UserId,
        store: Arc<SessionStore>,
        provider: Arc<P>,
        sink: Arc<R>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            user,
            store,
            provider,
            sink,
            settings,
        }
    }

    /// Process messages until the inbox closes or stays empty for `idle_timeout`.
    ///
    /// On idle the worker removes its own entry from `workers`. The entry can
    /// only belong to this worker while the receiver is open, since the
    /// manager replaces closed inboxes only.
    pub async fn run(
        self,
        mut inbox: mpsc::Receiver<InboundMessage>,
        idle_timeout: Duration,
        workers: Arc<Inboxes>,
    ) {
        tracing::debug!(user = %self.user, "Starting user runtime");

        loop {
            match tokio::time::timeout(idle_timeout, inbox.recv()).await {
                Ok(Some(message)) => self.handle_message(message).await,
                Ok(None) => break,
                Err(_) => {
                    let mut workers = workers.write().await;
                    if !inbox.is_empty() {
                        continue;
                    }
                    workers.remove(&self.user);
                    inbox.close();
                    // A dispatch may have sent between the emptiness check and
                    // close; handle it while the lock keeps a successor from starting
                    while let Ok(message) = inbox.try_recv() {
                        self.handle_message(message).await;
                    }
                    tracing::debug!(user = %self.user, "User runtime idle, retiring");
                    break;
                }
            }
        }

        tracing::debug!(user = %self.user, "User runtime stopped");
    }

    pub async fn handle_message(&self, message: InboundMessage) {
        let event = Event::user_text(&message.text);
        if let Err(e) = self.process_event(message.chat, event).await {
            tracing::error!(user = %self.user, error = %e, "Error handling message");
        }
    }

    async fn process_event(&self, chat: ChatId, event: Event) -> Result<(), TransitionError> {
        // Follow-up events from lookups are processed before the next message
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let session = self.store.snapshot(self.user).await;
            let is_user_text = matches!(current_event, Event::UserText { .. });
            let result = transition(&session, current_event)?;

            if result.is_ignored() && is_user_text {
                tracing::debug!(user = %self.user, stage = ?session.stage, "Message ignored");
            }

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(chat, effect).await {
                    events_to_process.push(generated);
                }
            }
        }

        Ok(())
    }

    async fn execute_effect(&self, chat: ChatId, effect: Effect) -> Option<Event> {
        match effect {
            Effect::StartSubscription => {
                self.store.start(self.user).await;
                tracing::info!(user = %self.user, "Subscription started");
                None
            }

            Effect::ClearSession => {
                self.store.clear(self.user).await;
                tracing::info!(user = %self.user, "Session cleared");
                None
            }

            Effect::SetStage(ConversationStage::None) => {
                self.store.clear_stage(self.user).await;
                None
            }

            Effect::SetStage(stage) => {
                self.store.set_stage(self.user, stage).await;
                None
            }

            Effect::AppendLocation { name } => {
                match self.store.add_location(self.user, &name).await {
                    Ok(()) => tracing::info!(user = %self.user, location = %name, "Location added"),
                    Err(e) => tracing::warn!(user = %self.user, error = %e, "Location not added"),
                }
                None
            }

            Effect::CheckLocation { candidate } => {
                let outcome = match self.lookup(&candidate).await {
                    Ok(_) => LookupOutcome::Found,
                    Err(e) => {
                        tracing::info!(
                            user = %self.user,
                            location = %candidate,
                            error = %e,
                            timed_out = e.is_timeout(),
                            "Candidate location rejected"
                        );
                        LookupOutcome::NotFound
                    }
                };
                Some(Event::LocationChecked { candidate, outcome })
            }

            Effect::FetchForecasts { locations } => {
                let forecasts = match self.fetch_all(&locations).await {
                    Ok(forecasts) => Some(forecasts),
                    Err(e) => {
                        tracing::warn!(
                            user = %self.user,
                            locations = locations.len(),
                            error = %e,
                            "Weather query failed"
                        );
                        None
                    }
                };
                Some(Event::ForecastsReady { forecasts })
            }

            Effect::Reply(reply) => {
                if let Err(e) = self.sink.send_reply(chat, &reply).await {
                    tracing::error!(user = %self.user, chat = %chat, error = %e, "Failed to send reply");
                }
                None
            }
        }
    }

    /// One provider call bounded by the fetch timeout; an empty series counts as a failure
    async fn lookup(&self, location: &str) -> Result<ForecastSeries, LocationLookupError> {
        let timeout = self.settings.fetch_timeout;
        let series = tokio::time::timeout(timeout, self.provider.fetch_forecast(location))
            .await
            .map_err(|_| LocationLookupError::Timeout(timeout))??;

        if series.samples.is_empty() {
            return Err(LocationLookupError::Empty(location.to_string()));
        }
        Ok(series)
    }

    /// Fetch every location concurrently; the first failure fails the whole query
    async fn fetch_all(
        &self,
        locations: &[String],
    ) -> Result<Vec<LocationForecast>, LocationLookupError> {
        let zone = self.settings.zone;
        try_join_all(locations.iter().map(|location| async move {
            let series = self.lookup(location).await?;
            Ok::<_, LocationLookupError>(LocationForecast {
                location: location.clone(),
                digest: render_forecast(&series.samples, zone),
            })
        }))
        .await
    }
}
