// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic eviction of idle sessions.
//!
//! Expiry is already applied lazily on the next event; the sweep only
//! bounds memory and table size.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::engine::ConversationEngine;

pub fn spawn_sweeper(
    engine: Arc<ConversationEngine>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = engine.sweep(Utc::now()).await {
                        warn!(error = %e, "session sweep failed");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("session sweeper shutting down");
                    break;
                }
            }
        }
    })
}
