// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use blacklab_core::{BlacklabError, HealthStatus, Order, Package, UserId};
use blacklab_whatsapp::signature::{self, SIGNATURE_HEADER};
use blacklab_whatsapp::{SubscriptionQuery, parse_webhook};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::server::GatewayState;

const DEFAULT_ORDER_LIMIT: usize = 50;
const MAX_ORDER_LIMIT: usize = 500;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Store failures surface as 500 with the error text.
pub struct ApiError(BlacklabError);

impl From<BlacklabError> for ApiError {
    fn from(e: BlacklabError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "admin request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// GET /webhook
///
/// Subscription handshake: echoes `hub.challenge` when the verify token
/// matches, 403 otherwise.
pub async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(query): Query<SubscriptionQuery>,
) -> Response {
    match query.verify(state.webhook.verify_token.as_deref()) {
        Some(challenge) => {
            debug!("webhook subscription verified");
            (StatusCode::OK, challenge.to_string()).into_response()
        }
        None => {
            warn!(mode = ?query.mode, "webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST /webhook
///
/// Acknowledges as soon as the delivery is queued; handling happens on
/// the per-user dispatcher.
pub async fn receive_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = state.webhook.app_secret.as_deref() {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if !signature::verify(secret, &body, header) {
            warn!("webhook signature mismatch");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let payload = match parse_webhook(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "rejecting webhook delivery");
            return StatusCode::BAD_REQUEST;
        }
    };
    if !payload.is_whatsapp() {
        debug!(object = %payload.object, "ignoring non-WhatsApp webhook");
        return StatusCode::NOT_FOUND;
    }

    let events = payload.into_events();
    debug!(count = events.len(), "webhook delivery queued");
    for event in events {
        state.dispatcher.dispatch(event);
    }
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub active_users: usize,
    pub adapters: BTreeMap<String, String>,
}

/// GET /health
///
/// 503 when any adapter is unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthResponse>) {
    let mut adapters = BTreeMap::new();
    let mut worst = HealthStatus::Healthy;
    for adapter in &state.health.adapters {
        let status = adapter
            .health_check()
            .await
            .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
        let label = match &status {
            HealthStatus::Healthy => "healthy".to_string(),
            HealthStatus::Degraded(why) => format!("degraded: {why}"),
            HealthStatus::Unhealthy(why) => format!("unhealthy: {why}"),
        };
        adapters.insert(adapter.name().to_string(), label);
        if severity(&status) > severity(&worst) {
            worst = status;
        }
    }

    let (code, status) = match worst {
        HealthStatus::Healthy => (StatusCode::OK, "healthy"),
        HealthStatus::Degraded(_) => (StatusCode::OK, "degraded"),
        HealthStatus::Unhealthy(_) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: state.health.start_time.elapsed().as_secs(),
            active_users: state.dispatcher.active_users(),
            adapters,
        }),
    )
}

fn severity(status: &HealthStatus) -> u8 {
    match status {
        HealthStatus::Healthy => 0,
        HealthStatus::Degraded(_) => 1,
        HealthStatus::Unhealthy(_) => 2,
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub limit: Option<usize>,
}

/// GET /v1/orders?limit=N
///
/// Newest first; `limit` defaults to 50 and is capped at 500.
pub async fn list_orders(
    State(state): State<GatewayState>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_ORDER_LIMIT)
        .min(MAX_ORDER_LIMIT);
    Ok(Json(state.admin.orders.list(limit).await?))
}

/// GET /v1/packages
pub async fn list_packages(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<Package>>, ApiError> {
    Ok(Json(state.admin.catalog.list_all().await?))
}

/// GET /v1/users
pub async fn list_users(State(state): State<GatewayState>) -> Result<Json<Vec<UserId>>, ApiError> {
    Ok(Json(state.admin.users.list().await?))
}
