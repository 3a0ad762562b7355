//! Runtime for executing conversations
//!
//! Each user gets a worker task fed by its own channel, so one user's
//! messages are handled strictly in arrival order while different users
//! proceed in parallel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::UserRuntime;
pub use traits::*;

use crate::session::{ChatId, SessionStore, UserId};
use crate::state_machine::Reply;
use crate::telegram::TelegramClient;
use crate::weather::LoggingProvider;
use chrono::FixedOffset;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = RuntimeManager<LoggingProvider, TelegramClient>;

/// Messages a user may have waiting before new ones are turned away
const INBOX_CAPACITY: usize = 32;

/// A worker with nothing to do for this long shuts down
pub const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Live worker inboxes, shared with the workers so they can retire themselves
pub(crate) type Inboxes = RwLock<HashMap<UserId, mpsc::Sender<InboundMessage>>>;

/// A text message as delivered by the chat transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub user: UserId,
    pub chat: ChatId,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct RuntimeSettings {
    /// Reference zone for bucketing forecast samples into days and periods
    pub zone: FixedOffset,
    /// Upper bound on a single provider call
    pub fetch_timeout: Duration,
}

/// Manager for all per-user runtimes
pub struct RuntimeManager<P, R>
where
    P: ForecastProvider + 'static,
    R: ReplySink + 'static,
{
    store: Arc<SessionStore>,
    provider: Arc<P>,
    sink: Arc<R>,
    settings: RuntimeSettings,
    idle_timeout: Duration,
    workers: Arc<Inboxes>,
}

impl<P, R> RuntimeManager<P, R>
where
    P: ForecastProvider + 'static,
    R: ReplySink + 'static,
{
    pub fn new(
        store: Arc<SessionStore>,
        provider: Arc<P>,
        sink: Arc<R>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            store,
            provider,
            sink,
            settings,
            idle_timeout: WORKER_IDLE_TIMEOUT,
            workers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[allow(dead_code)] // Used by tests
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Queue a message on its user's worker, starting one if needed.
    ///
    /// Never waits for room in a user's inbox: a full inbox turns the
    /// message away with a "busy" reply so other users keep flowing.
    pub async fn dispatch(&self, message: InboundMessage) {
        let user = message.user;
        let inbox = self.get_or_spawn(user).await;

        let message = match inbox.try_send(message) {
            Ok(()) => return,
            Err(TrySendError::Full(message)) => {
                self.reject_busy(message);
                return;
            }
            Err(TrySendError::Closed(message)) => message,
        };

        // Worker retired or died between lookup and send; start a fresh one
        tracing::debug!(user = %user, "User runtime gone, restarting");
        self.remove_closed(user).await;
        let inbox = self.get_or_spawn(user).await;
        match inbox.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => self.reject_busy(message),
            Err(TrySendError::Closed(_)) => {
                tracing::error!(user = %user, "Dropping message, user runtime unavailable");
            }
        }
    }

    fn reject_busy(&self, message: InboundMessage) {
        tracing::warn!(
            user = %message.user,
            capacity = INBOX_CAPACITY,
            "User inbox full, rejecting message"
        );
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.send_reply(message.chat, &Reply::busy()).await {
                tracing::error!(user = %message.user, error = %e, "Failed to send busy reply");
            }
        });
    }

    async fn remove_closed(&self, user: UserId) {
        let mut workers = self.workers.write().await;
        if workers.get(&user).is_some_and(mpsc::Sender::is_closed) {
            workers.remove(&user);
        }
    }

    async fn get_or_spawn(&self, user: UserId) -> mpsc::Sender<InboundMessage> {
        {
            let workers = self.workers.read().await;
            if let Some(inbox) = workers.get(&user) {
                if !inbox.is_closed() {
                    return inbox.clone();
                }
            }
        }

        let mut workers = self.workers.write().await;
        // Another dispatch may have won the race for the write lock
        if let Some(inbox) = workers.get(&user) {
            if !inbox.is_closed() {
                return inbox.clone();
            }
        }

        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let runtime = UserRuntime::new(
            user,
            self.store.clone(),
            self.provider.clone(),
            self.sink.clone(),
            self.settings,
        );
        let registry = Arc::clone(&self.workers);
        let idle_timeout = self.idle_timeout;
        tokio::spawn(async move {
            runtime.run(rx, idle_timeout, registry).await;
            tracing::debug!(user = %user, "User runtime finished");
        });

        workers.insert(user, tx.clone());
        tracing::debug!(user = %user, workers = workers.len(), "Spawned user runtime");
        tx
    }

    #[allow(dead_code)] // Used by tests
    pub async fn worker_count(&self) -> usize {
        self.workers.read().await.len()
    }
}
