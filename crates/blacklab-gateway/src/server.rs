// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{Router, middleware as axum_middleware, routing::get};
use blacklab_config::model::ServerConfig;
use blacklab_core::{BlacklabError, OrderStore, PackageCatalog, PluginAdapter, UserDirectory};
use blacklab_flow::Dispatcher;
use tokio_util::sync::CancellationToken;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Upper bound on webhook requests handled at once.
const WEBHOOK_CONCURRENCY: usize = 256;

/// Secrets the webhook endpoints check deliveries against.
#[derive(Clone, Default)]
pub struct WebhookConfig {
    /// Echoed back during the subscription handshake.
    pub verify_token: Option<String>,
    /// When set, `X-Hub-Signature-256` is required on every delivery.
    pub app_secret: Option<String>,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("verify_token", &self.verify_token.as_ref().map(|_| "[redacted]"))
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Read-only stores behind the admin API.
#[derive(Clone)]
pub struct AdminStores {
    pub catalog: Arc<dyn PackageCatalog>,
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserDirectory>,
}

/// Inputs of the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Instant,
    /// Adapters whose health is reported, e.g. storage and channel.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<Dispatcher>,
    pub webhook: WebhookConfig,
    pub admin: AdminStores,
    pub auth: AuthConfig,
    pub health: HealthState,
}

/// Builds the application router.
///
/// - GET/POST /webhook (provider-authenticated)
/// - GET /health (public)
/// - GET /v1/orders, /v1/packages, /v1/users (bearer token)
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let webhook_routes = Router::new()
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .layer(ConcurrencyLimitLayer::new(WEBHOOK_CONCURRENCY))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/v1/orders", get(handlers::list_orders))
        .route("/v1/packages", get(handlers::list_packages))
        .route("/v1/users", get(handlers::list_users))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(webhook_routes)
        .merge(public_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `host:port` and serves until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), BlacklabError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BlacklabError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| BlacklabError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
