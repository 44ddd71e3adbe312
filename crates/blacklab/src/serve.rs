// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `blacklab serve` command implementation.
//!
//! Opens SQLite storage, connects the WhatsApp channel, starts the
//! conversation engine with its sweeper and dispatcher, and serves the
//! webhook gateway until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::{Duration, Instant};

use blacklab_config::{BlacklabConfig, SessionBackend};
use blacklab_core::{
    BlacklabError, ChannelAdapter, HealthStatus, PluginAdapter, SessionStore, StorageAdapter,
};
use blacklab_flow::{
    ConversationEngine, Dispatcher, EngineConfig, EngineStores, register_metrics, spawn_sweeper,
};
use blacklab_gateway::{AdminStores, AuthConfig, GatewayState, HealthState, WebhookConfig};
use blacklab_storage::{MemoryStore, SqliteStorage};
use blacklab_whatsapp::WhatsAppChannel;
use tracing::{error, info, warn};

use crate::shutdown;

/// Per-user workers exit after this long without events.
const WORKER_IDLE: Duration = Duration::from_secs(60);

/// Runs the `blacklab serve` command.
pub async fn run_serve(config: BlacklabConfig) -> Result<(), BlacklabError> {
    info!(name = %config.bot.name, "starting blacklab serve");
    register_metrics();

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let sessions: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Memory => Arc::new(MemoryStore::new()),
        SessionBackend::Sqlite => storage.clone(),
    };
    info!(backend = %config.session.backend, "session store ready");

    let channel = Arc::new(WhatsAppChannel::new(
        &config.whatsapp,
        config.business.clone(),
    )?);
    match channel.health_check().await? {
        HealthStatus::Healthy => info!("WhatsApp Cloud API reachable"),
        HealthStatus::Degraded(why) | HealthStatus::Unhealthy(why) => {
            warn!(reason = %why, "WhatsApp Cloud API check failed; continuing")
        }
    }
    if config.whatsapp.app_secret.is_none() {
        warn!("whatsapp.app_secret not set; webhook signatures will not be verified");
    }

    let stores = EngineStores {
        catalog: storage.clone(),
        sessions,
        orders: storage.clone(),
        users: storage.clone(),
    };
    let send_channel: Arc<dyn ChannelAdapter> = channel.clone();
    let engine = Arc::new(ConversationEngine::new(
        stores,
        send_channel,
        EngineConfig::from(&config.session),
    ));

    let cancel = shutdown::install_signal_handler();

    let sweeper = spawn_sweeper(
        engine.clone(),
        Duration::from_secs(config.session.sweep_interval_secs),
        cancel.clone(),
    );
    info!(
        every_secs = config.session.sweep_interval_secs,
        timeout_secs = config.session.timeout_secs,
        "session sweeper started"
    );

    let dispatcher = Arc::new(Dispatcher::new(engine, WORKER_IDLE));

    let storage_health: Arc<dyn PluginAdapter> = storage.clone();
    let channel_health: Arc<dyn PluginAdapter> = channel.clone();
    let state = GatewayState {
        dispatcher: dispatcher.clone(),
        webhook: WebhookConfig {
            verify_token: config.whatsapp.verify_token.clone(),
            app_secret: config.whatsapp.app_secret.clone(),
        },
        admin: AdminStores {
            catalog: storage.clone(),
            orders: storage.clone(),
            users: storage.clone(),
        },
        auth: AuthConfig {
            bearer_token: config.server.admin_token.clone(),
        },
        health: HealthState {
            start_time: Instant::now(),
            adapters: vec![storage_health, channel_health],
        },
    };

    let served = blacklab_gateway::start_server(&config.server, state, cancel.clone()).await;
    if let Err(e) = &served {
        error!(error = %e, "gateway stopped with an error");
    }

    // Drain in-flight conversations before closing storage.
    cancel.cancel();
    dispatcher.shutdown().await;
    if let Err(e) = sweeper.await {
        warn!(error = %e, "session sweeper task failed");
    }
    channel.shutdown().await?;
    storage.close().await?;

    served?;
    info!("blacklab serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise BlackLab crates log at `log_level` and
/// everything else at `warn`.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("blacklab={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
