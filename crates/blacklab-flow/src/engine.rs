// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation Session Engine.
//!
//! Applies one inbound event to one user's session: dedup, lazy expiry,
//! catalog lookup, transition, then effects. Events for the same user are
//! serialized by a per-user lock held across the whole sequence, so a
//! session is persisted before the next event for that user is read.

use std::sync::Arc;
use std::time::Duration;

use blacklab_config::model::SessionConfig;
use blacklab_core::{
    BlacklabError, ChannelAdapter, ConversationSession, FlowState, InboundEvent, InboundKind,
    OrderStore, PackageCatalog, SessionStore, UserDirectory, UserId,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::dedup::DedupCache;
use crate::metrics;
use crate::transition::{
    CatalogAnswer, Effect, FlowContext, Lookup, TransitionResult, lookup_for, reprompt, transition,
};

/// How an event was handled. None of these are failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The event was applied; `state` is the session's new state.
    Processed { state: FlowState },
    /// The message id was seen before; nothing was done.
    Duplicate,
    /// The event is older than one already applied for this user.
    Stale,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub session_timeout: Duration,
    pub dedup_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for EngineConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            session_timeout: Duration::from_secs(config.timeout_secs),
            dedup_capacity: config.dedup_capacity,
        }
    }
}

/// Collaborators the engine reads from and writes to.
#[derive(Clone)]
pub struct EngineStores {
    pub catalog: Arc<dyn PackageCatalog>,
    pub sessions: Arc<dyn SessionStore>,
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserDirectory>,
}

pub struct ConversationEngine {
    stores: EngineStores,
    channel: Arc<dyn ChannelAdapter>,
    dedup: DedupCache,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
    config: EngineConfig,
}

impl ConversationEngine {
    pub fn new(stores: EngineStores, channel: Arc<dyn ChannelAdapter>, config: EngineConfig) -> Self {
        Self {
            dedup: DedupCache::new(config.dedup_capacity),
            stores,
            channel,
            locks: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handles an event using the current time.
    pub async fn handle(&self, event: InboundEvent) -> Result<HandleOutcome, BlacklabError> {
        self.handle_at(event, Utc::now()).await
    }

    /// Handles an event as if processed at `now`.
    ///
    /// On `Err` the session is left as it was and the message id is released,
    /// so a provider redelivery gets another chance. Once an order has been
    /// stored the event is never reported as failed: later send or save
    /// failures are logged and the message id stays claimed.
    pub async fn handle_at(
        &self,
        event: InboundEvent,
        now: DateTime<Utc>,
    ) -> Result<HandleOutcome, BlacklabError> {
        metrics::record_event(kind_label(&event.kind));

        let lock = self.user_lock(&event.from);
        let _guard = lock.lock().await;

        if !self.dedup.claim(&event.id) {
            metrics::record_duplicate();
            debug!(user = %event.from, message_id = %event.id, "duplicate event ignored");
            return Ok(HandleOutcome::Duplicate);
        }

        match self.apply(&event, now).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.dedup.release(&event.id);
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        event: &InboundEvent,
        now: DateTime<Utc>,
    ) -> Result<HandleOutcome, BlacklabError> {
        let user = &event.from;

        if let Err(e) = self.stores.users.record(user, now).await {
            warn!(user = %user, error = %e, "failed to record user");
        }

        let mut session = match self.stores.sessions.load(user).await? {
            Some(mut s) if s.is_expired(now, self.config.session_timeout) => {
                debug!(user = %user, state = s.state.name(), "session expired");
                s.reset(now);
                s
            }
            Some(s) => s,
            None => ConversationSession::new(user.clone(), now),
        };

        if let (Some(at), Some(last)) = (event.timestamp, session.last_event_at)
            && at < last
        {
            info!(
                user = %user,
                message_id = %event.id,
                state = session.state.name(),
                "out-of-order event ignored; repeating current question"
            );
            for intent in reprompt(&session.state).intents() {
                if let Err(e) = self.channel.send(user, intent).await {
                    metrics::record_send_failure(intent.kind());
                    warn!(user = %user, intent = intent.kind(), error = %e, "reprompt after stale event failed");
                    break;
                }
            }
            return Ok(HandleOutcome::Stale);
        }

        let answer = match lookup_for(&session.state, &event.kind) {
            Some(lookup) => Some(self.lookup(lookup).await?),
            None => None,
        };

        let ctx = FlowContext {
            user: user.clone(),
            now,
        };
        let result = transition(&session.state, &event.kind, answer, &ctx);
        debug!(
            user = %user,
            message_id = %event.id,
            from = session.state.name(),
            to = result.new_state.name(),
            "transition"
        );

        let committed = self.execute(user, &result).await?;

        let was_idle = session.state.is_idle();
        session.state = result.new_state;
        if session.state.is_idle() && !was_idle {
            session.reset(now);
        }
        session.last_activity_at = now;
        if event.timestamp.is_some() {
            session.last_event_at = event.timestamp.max(session.last_event_at);
        }
        if let Err(e) = self.stores.sessions.save(&session).await {
            if !committed {
                return Err(e);
            }
            self.save_after_commit(&session, e).await;
        }

        Ok(HandleOutcome::Processed {
            state: session.state,
        })
    }

    async fn lookup(&self, lookup: Lookup) -> Result<CatalogAnswer, BlacklabError> {
        Ok(match lookup {
            Lookup::Category(category) => {
                CatalogAnswer::Packages(self.stores.catalog.list_by_category(category).await?)
            }
            Lookup::Package(id) => CatalogAnswer::Package(self.stores.catalog.get_by_id(&id).await?),
        })
    }

    /// Runs effects in order and reports whether an order was stored. A send
    /// failure before any order was stored aborts so the caller keeps the old
    /// session.
    async fn execute(&self, user: &UserId, result: &TransitionResult) -> Result<bool, BlacklabError> {
        let mut committed = false;
        for effect in &result.effects {
            match effect {
                Effect::PlaceOrder(order) => {
                    self.stores.orders.create(order).await?;
                    committed = true;
                    metrics::record_order(order.package.category.to_string());
                    info!(
                        order_id = %order.id,
                        user = %user,
                        package = %order.package.id,
                        amount = order.package.price,
                        payer = %order.payer,
                        recipient = %order.recipient,
                        "order placed; STK push requested"
                    );
                }
                Effect::Send(intent) => {
                    if let Err(e) = self.channel.send(user, intent).await {
                        metrics::record_send_failure(intent.kind());
                        if !committed {
                            warn!(user = %user, intent = intent.kind(), error = %e, "send failed; session unchanged");
                            return Err(e);
                        }
                        warn!(user = %user, intent = intent.kind(), error = %e, "send failed after order was stored");
                    }
                }
            }
        }
        Ok(committed)
    }

    /// Persists `session` after its order was stored. The stored session
    /// must not stay in `AwaitingConfirmation`, so a second failed save
    /// falls back to removing it, which also reads as `Idle`.
    async fn save_after_commit(&self, session: &ConversationSession, first: BlacklabError) {
        let user = &session.user_id;
        warn!(user = %user, error = %first, "session save failed after order was stored; retrying");
        let Err(e) = self.stores.sessions.save(session).await else {
            return;
        };
        if let Err(remove_err) = self.stores.sessions.remove(user).await {
            error!(
                user = %user,
                save_error = %e,
                remove_error = %remove_err,
                "could not persist session after order was stored"
            );
        }
    }

    /// Drops any in-progress flow for `user`.
    pub async fn reset(&self, user: &UserId) -> Result<(), BlacklabError> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.stores.sessions.remove(user).await
    }

    /// Evicts sessions idle past the timeout and forgets unused user locks.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize, BlacklabError> {
        let timeout = chrono::Duration::from_std(self.config.session_timeout)
            .map_err(|e| BlacklabError::Internal(format!("session timeout out of range: {e}")))?;
        let evicted = self.stores.sessions.evict_idle(now - timeout).await?;
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        if evicted > 0 {
            metrics::record_evicted(evicted);
            info!(evicted, "idle sessions evicted");
        }
        Ok(evicted)
    }

    fn user_lock(&self, user: &UserId) -> Arc<Mutex<()>> {
        self.locks.entry(user.clone()).or_default().clone()
    }
}

fn kind_label(kind: &InboundKind) -> &'static str {
    match kind {
        InboundKind::ButtonReply { .. } => "button",
        InboundKind::ListReply { .. } => "list",
        InboundKind::FreeText { .. } => "text",
        InboundKind::Unknown => "unknown",
    }
}
