// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for sessions, orders and known users.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BlacklabError;
use crate::order::{Order, OrderId, OrderStatus};
use crate::session::ConversationSession;
use crate::traits::adapter::PluginAdapter;
use crate::types::UserId;

/// Lifecycle of a storage backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens connections and runs migrations. Safe to call more than once.
    async fn initialize(&self) -> Result<(), BlacklabError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), BlacklabError>;
}

/// Keyed store of one [`ConversationSession`] per user.
///
/// Callers serialize access per user; implementations only need to be
/// safe for concurrent access across different users.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, user: &UserId) -> Result<Option<ConversationSession>, BlacklabError>;

    async fn save(&self, session: &ConversationSession) -> Result<(), BlacklabError>;

    async fn remove(&self, user: &UserId) -> Result<(), BlacklabError>;

    /// Deletes sessions whose last activity is before `cutoff`, returning how many.
    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> Result<usize, BlacklabError>;

    async fn clear(&self) -> Result<(), BlacklabError>;

    async fn count(&self) -> Result<usize, BlacklabError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: &Order) -> Result<(), BlacklabError>;

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, BlacklabError>;

    /// Newest first.
    async fn list(&self, limit: usize) -> Result<Vec<Order>, BlacklabError>;

    /// Applies a status change, rejecting anything but `pending -> confirmed|failed`.
    async fn update_status(&self, id: &OrderId, status: OrderStatus)
    -> Result<Order, BlacklabError>;
}

/// Append-only record of every phone number that has messaged the bot.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Records `user`; returns `true` the first time it is seen.
    async fn record(&self, user: &UserId, seen_at: DateTime<Utc>) -> Result<bool, BlacklabError>;

    async fn list(&self) -> Result<Vec<UserId>, BlacklabError>;
}
