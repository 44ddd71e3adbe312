// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end conversation tests.
//!
//! `TestHarness` assembles a [`ConversationEngine`] with a [`MockChannel`]
//! and either in-memory or temp-file SQLite storage, and offers helpers
//! that play the user's side of the chat.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use blacklab_config::BlacklabConfig;
use blacklab_config::model::StorageConfig;
use blacklab_core::{
    BlacklabError, FlowState, InboundEvent, InboundKind, MessageId, Order, Package,
    StorageAdapter, UserId,
};
use blacklab_flow::{ConversationEngine, Dispatcher, EngineConfig, EngineStores, HandleOutcome};
use blacklab_storage::{MemoryStore, SqliteStorage, default_packages};
use chrono::{DateTime, Utc};

use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    packages: Vec<Package>,
    session_timeout: Duration,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            packages: default_packages(),
            session_timeout: Duration::from_secs(900),
            sqlite: false,
        }
    }

    /// Replaces the default catalog.
    pub fn with_packages(mut self, packages: Vec<Package>) -> Self {
        self.packages = packages;
        self
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Backs every store with a SQLite database in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, BlacklabError> {
        let mut config = BlacklabConfig::default();
        config.session.timeout_secs = self.session_timeout.as_secs();

        let (stores, temp_dir) = if self.sqlite {
            let temp_dir = tempfile::TempDir::new().map_err(BlacklabError::storage)?;
            let db_path = temp_dir.path().join("blacklab-test.db");
            config.storage = StorageConfig {
                database_path: db_path.to_string_lossy().to_string(),
                wal_mode: true,
            };
            let storage = SqliteStorage::new(config.storage.clone());
            storage.initialize().await?;
            for package in &self.packages {
                storage.add_package(package).await?;
            }
            let storage = Arc::new(storage);
            let stores = EngineStores {
                catalog: storage.clone(),
                sessions: storage.clone(),
                orders: storage.clone(),
                users: storage,
            };
            (stores, Some(temp_dir))
        } else {
            let store = Arc::new(MemoryStore::with_packages(self.packages));
            let stores = EngineStores {
                catalog: store.clone(),
                sessions: store.clone(),
                orders: store.clone(),
                users: store,
            };
            (stores, None)
        };

        let channel = Arc::new(MockChannel::new());
        let engine_config = EngineConfig {
            session_timeout: self.session_timeout,
            ..EngineConfig::from(&config.session)
        };
        let engine = Arc::new(ConversationEngine::new(
            stores.clone(),
            channel.clone(),
            engine_config,
        ));

        Ok(TestHarness {
            engine,
            channel,
            stores,
            config,
            next_id: AtomicUsize::new(0),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete conversation stack with a mock channel.
pub struct TestHarness {
    pub engine: Arc<ConversationEngine>,
    pub channel: Arc<MockChannel>,
    pub stores: EngineStores,
    pub config: BlacklabConfig,
    next_id: AtomicUsize,
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// In-memory harness with the default catalog.
    pub async fn new() -> Result<Self, BlacklabError> {
        Self::builder().build().await
    }

    /// An event from `user` with a fresh message id and no provider timestamp.
    pub fn event(&self, user: &UserId, kind: InboundKind) -> InboundEvent {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        InboundEvent {
            id: MessageId(format!("wamid.test.{n}")),
            from: user.clone(),
            timestamp: None,
            kind,
        }
    }

    pub async fn send_text(&self, user: &UserId, text: &str) -> Result<HandleOutcome, BlacklabError> {
        let kind = InboundKind::FreeText { text: text.into() };
        self.engine.handle(self.event(user, kind)).await
    }

    pub async fn tap_button(&self, user: &UserId, id: &str) -> Result<HandleOutcome, BlacklabError> {
        let kind = InboundKind::ButtonReply { id: id.into() };
        self.engine.handle(self.event(user, kind)).await
    }

    pub async fn pick_row(&self, user: &UserId, id: &str) -> Result<HandleOutcome, BlacklabError> {
        let kind = InboundKind::ListReply { id: id.into() };
        self.engine.handle(self.event(user, kind)).await
    }

    /// Handles `kind` as if it arrived at `now`.
    pub async fn send_at(
        &self,
        user: &UserId,
        kind: InboundKind,
        now: DateTime<Utc>,
    ) -> Result<HandleOutcome, BlacklabError> {
        self.engine.handle_at(self.event(user, kind), now).await
    }

    pub async fn state(&self, user: &UserId) -> Result<Option<FlowState>, BlacklabError> {
        Ok(self.stores.sessions.load(user).await?.map(|s| s.state))
    }

    /// Orders placed so far, newest first.
    pub async fn orders(&self) -> Result<Vec<Order>, BlacklabError> {
        self.stores.orders.list(usize::MAX).await
    }

    /// A dispatcher over this harness's engine.
    pub fn dispatcher(&self, idle_timeout: Duration) -> Dispatcher {
        Dispatcher::new(self.engine.clone(), idle_timeout)
    }
}
