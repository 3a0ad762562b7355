//! Events that drive the stage machine

use super::Intent;

/// Events that trigger transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A text message from the user, already classified
    UserText { intent: Intent },

    /// Result of probing the provider with a candidate location name
    LocationChecked {
        candidate: String,
        outcome: LookupOutcome,
    },

    /// All forecasts for a weather query have settled
    ForecastsReady {
        /// `None` when any single location failed
        forecasts: Option<Vec<LocationForecast>>,
    },
}

impl Event {
    pub fn user_text(text: &str) -> Self {
        Event::UserText {
            intent: Intent::parse(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Found,
    NotFound,
}

/// A rendered digest for one tracked location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationForecast {
    pub location: String,
    pub digest: String,
}
