//! Per-user conversation stage machine
//!
//! Implements the Elm Architecture pattern with pure state transitions: the
//! runtime feeds events in, applies the returned effects, and feeds any
//! follow-up events (lookup results) back in.

mod effect;
pub mod event;
pub mod intent;
pub mod reply;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Event, LocationForecast, LookupOutcome};
pub use intent::Intent;
pub use reply::{Keyboard, Reply};
pub use transition::{transition, TransitionError, TransitionResult};
