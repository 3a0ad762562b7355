//! Effects produced by state transitions

use super::Reply;
use crate::session::ConversationStage;

/// Effects to be executed after a transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Create or replace the subscription with an empty one (stage reset)
    StartSubscription,

    /// Remove subscription and stage
    ClearSession,

    /// Change the conversation stage
    SetStage(ConversationStage),

    /// Append a validated location to the subscription
    AppendLocation { name: String },

    /// Probe the provider for a candidate; yields `Event::LocationChecked`
    CheckLocation { candidate: String },

    /// Fetch and aggregate every location concurrently; yields `Event::ForecastsReady`
    FetchForecasts { locations: Vec<String> },

    /// Send a message to the user
    Reply(Reply),
}

impl Effect {
    pub fn reply(reply: Reply) -> Self {
        Effect::Reply(reply)
    }

    pub fn await_location() -> Self {
        Effect::SetStage(ConversationStage::AwaitingLocationName)
    }

    pub fn reset_stage() -> Self {
        Effect::SetStage(ConversationStage::None)
    }
}
