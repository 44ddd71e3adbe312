// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user ordered delivery of inbound events to the engine.
//!
//! Each user with pending events gets one worker task fed by an unbounded
//! queue, so events for a user are handled one at a time in arrival order
//! while different users proceed concurrently. A worker exits after
//! `idle_timeout` without events.

use std::sync::Arc;
use std::time::Duration;

use blacklab_core::{InboundEvent, UserId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use crate::engine::{ConversationEngine, HandleOutcome};

type Queues = DashMap<UserId, mpsc::UnboundedSender<InboundEvent>>;

pub struct Dispatcher {
    engine: Arc<ConversationEngine>,
    queues: Arc<Queues>,
    idle_timeout: Duration,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(engine: Arc<ConversationEngine>, idle_timeout: Duration) -> Self {
        Self {
            engine,
            queues: Arc::new(DashMap::new()),
            idle_timeout,
            tracker: TaskTracker::new(),
        }
    }

    /// Queues `event` behind any earlier events from the same user.
    pub fn dispatch(&self, event: InboundEvent) {
        let mut event = event;
        loop {
            match self.queues.entry(event.from.clone()) {
                Entry::Occupied(slot) => {
                    let sent = slot.get().send(event);
                    match sent {
                        Ok(()) => return,
                        Err(mpsc::error::SendError(returned)) => {
                            // Worker is gone; replace it.
                            slot.remove();
                            event = returned;
                        }
                    }
                }
                Entry::Vacant(slot) => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    let user = event.from.clone();
                    if tx.send(event).is_err() {
                        return;
                    }
                    slot.insert(tx);
                    self.spawn_worker(user, rx);
                    return;
                }
            }
        }
    }

    /// Users with a live worker.
    pub fn active_users(&self) -> usize {
        self.queues.len()
    }

    /// Closes every queue and waits for workers to drain what was already queued.
    pub async fn shutdown(&self) {
        self.queues.clear();
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn spawn_worker(&self, user: UserId, mut rx: mpsc::UnboundedReceiver<InboundEvent>) {
        let engine = self.engine.clone();
        let queues = self.queues.clone();
        let idle = self.idle_timeout;
        self.tracker.spawn(async move {
            debug!(user = %user, "worker started");
            loop {
                match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(Some(event)) => process(&engine, event).await,
                    Ok(None) => break,
                    Err(_) => {
                        // Only retire while nothing is queued; dispatch sends under the same shard lock.
                        if queues.remove_if(&user, |_, _| rx.is_empty()).is_some() {
                            while let Ok(event) = rx.try_recv() {
                                process(&engine, event).await;
                            }
                            break;
                        }
                    }
                }
            }
            debug!(user = %user, "worker stopped");
        });
    }
}

async fn process(engine: &ConversationEngine, event: InboundEvent) {
    let user = event.from.clone();
    let message_id = event.id.clone();
    match engine.handle(event).await {
        Ok(HandleOutcome::Processed { state }) => {
            debug!(user = %user, message_id = %message_id, state = state.name(), "event processed");
        }
        Ok(outcome) => debug!(user = %user, message_id = %message_id, ?outcome, "event skipped"),
        Err(e @ blacklab_core::BlacklabError::Channel { .. }) => {
            warn!(user = %user, message_id = %message_id, error = %e, "reply not delivered");
        }
        Err(e) => error!(user = %user, message_id = %message_id, error = %e, "event handling failed"),
    }
}
