// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use blacklab_core::{
    AdapterType, BlacklabError, ChannelAdapter, HealthStatus, MessageId, OutboundIntent,
    PluginAdapter, UserId,
};

/// A messaging channel that records instead of sending.
///
/// `fail_next(n)` makes the next `n` sends return a channel error, which
/// is how tests exercise the engine's "reply not delivered" path.
#[derive(Default)]
pub struct MockChannel {
    sent: Mutex<Vec<(UserId, OutboundIntent)>>,
    failures: AtomicUsize,
    counter: AtomicUsize,
    notify: Notify,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every intent sent so far, with its recipient.
    pub async fn sent_messages(&self) -> Vec<(UserId, OutboundIntent)> {
        self.sent.lock().await.clone()
    }

    /// Intents sent to `user`, in order.
    pub async fn sent_to(&self, user: &UserId) -> Vec<OutboundIntent> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(to, _)| to == user)
            .map(|(_, intent)| intent.clone())
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Fails the next `n` sends.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Waits until at least `n` intents have been recorded.
    pub async fn wait_for_sent(&self, n: usize, timeout: Duration) -> Result<(), BlacklabError> {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.sent.lock().await.len() >= n {
                    return;
                }
                notified.await;
            }
        })
        .await
        .map_err(|_| BlacklabError::Timeout { duration: timeout })
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BlacklabError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BlacklabError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn send(&self, to: &UserId, intent: &OutboundIntent) -> Result<MessageId, BlacklabError> {
        if self.take_failure() {
            return Err(BlacklabError::Channel {
                message: "mock send failure".into(),
                source: None,
            });
        }
        self.sent.lock().await.push((to.clone(), intent.clone()));
        self.notify.notify_waiters();
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(MessageId(format!("wamid.mock.{n}")))
    }
}
