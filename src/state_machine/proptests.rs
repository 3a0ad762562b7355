//! Property-based tests for the stage machine
//!
//! Messages are driven through `transition` with a tiny in-test effect
//! interpreter standing in for the runtime, and session invariants are
//! checked after every step.

use super::event::{LocationForecast, LookupOutcome};
use super::*;
use crate::session::{canonical_location, ConversationStage, SessionSnapshot, Subscription};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Test Helpers
// ============================================================================

/// Locations the fake provider recognizes (any case)
const KNOWN: [&str; 4] = ["paris", "oslo", "kazan", "rome"];

fn provider_knows(candidate: &str) -> bool {
    KNOWN.contains(&canonical_location(candidate).as_str())
}

/// Apply effects the way the runtime does, feeding follow-up events back in
fn run(session: &mut SessionSnapshot, event: Event) -> Vec<Reply> {
    let mut replies = Vec::new();
    let mut pending = vec![event];

    while let Some(event) = pending.pop() {
        let result = transition(session, event).expect("user-driven events never fail");
        for effect in result.effects {
            match effect {
                Effect::StartSubscription => {
                    *session = SessionSnapshot {
                        stage: ConversationStage::None,
                        subscription: Some(Subscription::default()),
                    };
                }
                Effect::ClearSession => *session = SessionSnapshot::default(),
                Effect::SetStage(stage) => session.stage = stage,
                Effect::AppendLocation { name } => {
                    session
                        .subscription
                        .as_mut()
                        .expect("append only with a subscription")
                        .add(&name)
                        .expect("transition never appends duplicates");
                }
                Effect::CheckLocation { candidate } => {
                    let outcome = if provider_knows(&candidate) {
                        LookupOutcome::Found
                    } else {
                        LookupOutcome::NotFound
                    };
                    pending.push(Event::LocationChecked { candidate, outcome });
                }
                Effect::FetchForecasts { locations } => {
                    let forecasts = locations
                        .into_iter()
                        .map(|location| LocationForecast {
                            location,
                            digest: "01.06.24 (Сб): День: 20.00°C".to_string(),
                        })
                        .collect();
                    pending.push(Event::ForecastsReady {
                        forecasts: Some(forecasts),
                    });
                }
                Effect::Reply(reply) => replies.push(reply),
            }
        }
    }

    replies
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_city() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just("paris"),
            Just("oslo"),
            Just("kazan"),
            Just("rome"),
            Just("atlantis"),
            Just("gotham"),
        ],
        proptest::collection::vec(any::<bool>(), 8),
        0usize..3,
    )
        .prop_map(|(name, upper, pad)| {
            let cased: String = name
                .chars()
                .zip(upper.iter().cycle())
                .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
                .collect();
            format!("{}{cased}{}", " ".repeat(pad), " ".repeat(pad))
        })
}

fn arb_message() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just("/start".to_string()),
        1 => Just("/clear".to_string()),
        2 => Just("/addcity".to_string()),
        2 => Just("Добавить город".to_string()),
        2 => Just("Узнать погоду".to_string()),
        1 => Just("/help".to_string()),
        6 => arb_city(),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn locations_stay_unique_ignoring_case(
        messages in proptest::collection::vec(arb_message(), 1..40)
    ) {
        let mut session = SessionSnapshot::default();
        for msg in &messages {
            run(&mut session, Event::user_text(msg));

            let canon: Vec<String> =
                session.locations().iter().map(|l| canonical_location(l)).collect();
            let unique: HashSet<&String> = canon.iter().collect();
            prop_assert_eq!(unique.len(), canon.len());
            prop_assert!(session.locations().iter().all(|l| provider_knows(l)));
            prop_assert!(session.locations().iter().all(|l| l.trim() == l));
        }
    }

    #[test]
    fn clear_always_forgets_the_user(
        messages in proptest::collection::vec(arb_message(), 0..20)
    ) {
        let mut session = SessionSnapshot::default();
        for msg in &messages {
            run(&mut session, Event::user_text(msg));
        }

        let replies = run(&mut session, Event::user_text("/clear"));
        prop_assert_eq!(&session, &SessionSnapshot::default());
        prop_assert_eq!(replies, vec![Reply::session_cleared()]);

        let replies = run(&mut session, Event::user_text("Узнать погоду"));
        prop_assert_eq!(replies, vec![Reply::no_locations()]);
    }

    #[test]
    fn start_always_yields_fresh_subscription(
        messages in proptest::collection::vec(arb_message(), 0..20)
    ) {
        let mut session = SessionSnapshot::default();
        for msg in &messages {
            run(&mut session, Event::user_text(msg));
        }

        run(&mut session, Event::user_text("/start"));
        prop_assert_eq!(session.stage, ConversationStage::None);
        prop_assert!(session.has_subscription());
        prop_assert!(session.locations().is_empty());
    }

    #[test]
    fn every_message_gets_at_most_one_reply(
        messages in proptest::collection::vec(arb_message(), 1..30)
    ) {
        let mut session = SessionSnapshot::default();
        for msg in &messages {
            let replies = run(&mut session, Event::user_text(msg));
            prop_assert!(replies.len() <= 1);
        }
    }

    #[test]
    fn added_location_appears_as_section_header(city in arb_city()) {
        let mut session = SessionSnapshot::default();
        run(&mut session, Event::user_text("/start"));
        run(&mut session, Event::user_text("/addcity"));
        run(&mut session, Event::user_text(&city));

        let replies = run(&mut session, Event::user_text("Узнать погоду"));
        prop_assert_eq!(replies.len(), 1);

        if provider_knows(&city) {
            let header = format!("{}:\n", city.trim());
            prop_assert!(replies[0].text.starts_with(&header));
            prop_assert_eq!(session.stage, ConversationStage::None);
        } else {
            prop_assert_eq!(&replies[0], &Reply::no_locations());
            prop_assert_eq!(session.stage, ConversationStage::AwaitingLocationName);
        }
    }
}
