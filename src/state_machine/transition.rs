//! Pure state transition function
//!
//! Given the same session snapshot and event it always produces the same
//! effects, with no I/O. Rules are evaluated in priority order: session
//! commands first, then weather queries, then the add-location dialogue.

use super::event::{LocationForecast, LookupOutcome};
use super::{Effect, Event, Intent, Reply};
use crate::session::{ConversationStage, SessionSnapshot};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, Default, PartialEq)]
pub struct TransitionResult {
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    /// No mutation, no reply
    pub fn ignore() -> Self {
        Self::default()
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn is_ignored(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("location lookup for \"{0}\" arrived while no location was expected")]
    UnexpectedLookup(String),
}

/// Pure transition function
pub fn transition(
    session: &SessionSnapshot,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::UserText { intent } => Ok(handle_user_text(session, intent)),
        Event::LocationChecked { candidate, outcome } => {
            handle_location_checked(session, candidate, outcome)
        }
        Event::ForecastsReady { forecasts } => Ok(handle_forecasts(forecasts)),
    }
}

fn handle_user_text(session: &SessionSnapshot, intent: Intent) -> TransitionResult {
    let awaiting = session.stage == ConversationStage::AwaitingLocationName;

    match intent {
        Intent::Start => TransitionResult::ignore()
            .with_effect(Effect::StartSubscription)
            .with_effect(Effect::reply(Reply::greeting())),

        Intent::Clear => TransitionResult::ignore()
            .with_effect(Effect::ClearSession)
            .with_effect(Effect::reply(Reply::session_cleared())),

        intent if intent.is_add_location() && session.has_subscription() => {
            TransitionResult::ignore()
                .with_effect(Effect::reply(Reply::ask_location()))
                .with_effect(Effect::await_location())
        }

        Intent::QueryWeather if session.locations().is_empty() => {
            TransitionResult::ignore().with_effect(Effect::reply(Reply::no_locations()))
        }

        Intent::QueryWeather => TransitionResult::ignore().with_effect(Effect::FetchForecasts {
            locations: session.locations().to_vec(),
        }),

        Intent::FreeText(text) if awaiting && session.has_subscription() => {
            handle_candidate(session, text.trim())
        }

        _ => TransitionResult::ignore(),
    }
}

fn handle_candidate(session: &SessionSnapshot, candidate: &str) -> TransitionResult {
    let already_tracked = session
        .subscription
        .as_ref()
        .is_some_and(|sub| sub.contains(candidate));

    if already_tracked {
        // Stage stays AwaitingLocationName so the user can type another name
        return TransitionResult::ignore()
            .with_effect(Effect::reply(Reply::already_tracked(candidate)));
    }

    if candidate.is_empty() {
        return TransitionResult::ignore()
            .with_effect(Effect::reply(Reply::location_not_found(candidate)));
    }

    TransitionResult::ignore().with_effect(Effect::CheckLocation {
        candidate: candidate.to_string(),
    })
}

fn handle_location_checked(
    session: &SessionSnapshot,
    candidate: String,
    outcome: LookupOutcome,
) -> Result<TransitionResult, TransitionError> {
    let subscription = match (&session.subscription, session.stage) {
        (Some(sub), ConversationStage::AwaitingLocationName) => sub,
        _ => return Err(TransitionError::UnexpectedLookup(candidate)),
    };

    let result = match outcome {
        LookupOutcome::NotFound => TransitionResult::ignore()
            .with_effect(Effect::reply(Reply::location_not_found(&candidate))),
        LookupOutcome::Found if subscription.contains(&candidate) => TransitionResult::ignore()
            .with_effect(Effect::reply(Reply::already_tracked(&candidate))),
        LookupOutcome::Found => {
            let added = Reply::location_added(&candidate);
            TransitionResult::ignore().with_effects([
                Effect::AppendLocation { name: candidate },
                Effect::reset_stage(),
                Effect::reply(added),
            ])
        }
    };
    Ok(result)
}

fn handle_forecasts(forecasts: Option<Vec<LocationForecast>>) -> TransitionResult {
    let reply = match forecasts {
        Some(forecasts) => Reply::with_menu(combine_forecasts(&forecasts)),
        None => Reply::forecast_failed(),
    };
    TransitionResult::ignore().with_effect(Effect::reply(reply))
}

/// `LOCATION:\n<digest>` blocks in subscription order
pub fn combine_forecasts(forecasts: &[LocationForecast]) -> String {
    forecasts
        .iter()
        .map(|f| format!("{}:\n{}", f.location, f.digest))
        .collect::<Vec<_>>()
        .join("\n")
}
