//! In-memory per-user session store
//!
//! Holds each user's subscription (tracked locations) and the ephemeral
//! conversation stage. Nothing survives a restart.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio::sync::RwLock;

/// Opaque chat-platform user identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation a reply is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Multi-turn interaction in progress for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationStage {
    #[default]
    None,
    AwaitingLocationName,
}

/// Case-folded form used only for comparing location names
pub fn canonical_location(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Ordered list of tracked locations, unique ignoring case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscription {
    locations: Vec<String>,
}

impl Subscription {
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn contains(&self, name: &str) -> bool {
        let wanted = canonical_location(name);
        self.locations
            .iter()
            .any(|existing| canonical_location(existing) == wanted)
    }

    pub(crate) fn add(&mut self, name: &str) -> Result<(), SessionError> {
        if self.contains(name) {
            return Err(SessionError::DuplicateLocation(name.to_string()));
        }
        self.locations.push(name.trim().to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct UserSession {
    subscription: Option<Subscription>,
    stage: ConversationStage,
}

impl UserSession {
    fn is_empty(&self) -> bool {
        self.subscription.is_none() && self.stage == ConversationStage::None
    }
}

/// Read-only view of one user's session, taken per event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub stage: ConversationStage,
    pub subscription: Option<Subscription>,
}

impl SessionSnapshot {
    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn locations(&self) -> &[String] {
        self.subscription
            .as_ref()
            .map(Subscription::locations)
            .unwrap_or_default()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("user has not started a session")]
    NotStarted,
    #[error("location \"{0}\" is already tracked")]
    DuplicateLocation(String),
}

/// Mapping from user to session. Absent entries mean "never started".
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, UserSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the user's subscription with an empty one
    pub async fn start(&self, user: UserId) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            user,
            UserSession {
                subscription: Some(Subscription::default()),
                stage: ConversationStage::None,
            },
        );
    }

    /// Drop the subscription and stage entirely
    pub async fn clear(&self, user: UserId) {
        self.sessions.write().await.remove(&user);
    }

    pub async fn snapshot(&self, user: UserId) -> SessionSnapshot {
        let sessions = self.sessions.read().await;
        sessions
            .get(&user)
            .map(|s| SessionSnapshot {
                stage: s.stage,
                subscription: s.subscription.clone(),
            })
            .unwrap_or_default()
    }

    #[allow(dead_code)] // Used by tests
    pub async fn stage(&self, user: UserId) -> ConversationStage {
        self.sessions
            .read()
            .await
            .get(&user)
            .map(|s| s.stage)
            .unwrap_or_default()
    }

    /// Set the stage; works whether or not a subscription exists
    pub async fn set_stage(&self, user: UserId, stage: ConversationStage) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user).or_default();
        session.stage = stage;
        if session.is_empty() {
            sessions.remove(&user);
        }
    }

    pub async fn clear_stage(&self, user: UserId) {
        self.set_stage(user, ConversationStage::None).await;
    }

    /// Append a location, rejecting case-insensitive duplicates
    pub async fn add_location(&self, user: UserId, name: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .get_mut(&user)
            .and_then(|s| s.subscription.as_mut())
            .ok_or(SessionError::NotStarted)?
            .add(name)
    }

    pub async fn user_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
