// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel adapter for the BlackLab ordering bot.
//!
//! Inbound: [`webhook`] parses deliveries into [`InboundEvent`]s and
//! [`signature`] verifies them. Outbound: [`WhatsAppChannel`] renders each
//! [`OutboundIntent`] with [`render::Renderer`] and posts it to the Graph API.
//!
//! [`InboundEvent`]: blacklab_core::InboundEvent

pub mod render;
pub mod signature;
pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;
use blacklab_config::model::{BusinessConfig, WhatsAppConfig};
use blacklab_core::{
    AdapterType, BlacklabError, ChannelAdapter, HealthStatus, MessageId, OutboundIntent,
    PluginAdapter, UserId,
};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

pub use render::Renderer;
pub use webhook::{SubscriptionQuery, WebhookPayload, parse_webhook};

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphErrorResponse {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// Sends messages through the Graph API `/{phone_number_id}/messages` endpoint.
///
/// Transient failures (network errors, 429, 5xx) are retried once after
/// `whatsapp.retry_backoff_ms`.
#[derive(Debug, Clone)]
pub struct WhatsAppChannel {
    client: reqwest::Client,
    renderer: Renderer,
    messages_url: String,
    phone_number_url: String,
    retry_backoff: Duration,
}

impl WhatsAppChannel {
    /// Requires `whatsapp.access_token` and `whatsapp.phone_number_id`.
    pub fn new(config: &WhatsAppConfig, business: BusinessConfig) -> Result<Self, BlacklabError> {
        let token = required(&config.access_token, "whatsapp.access_token")?;
        let phone_number_id = required(&config.phone_number_id, "whatsapp.phone_number_id")?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            BlacklabError::Config(format!("invalid whatsapp.access_token header value: {e}"))
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BlacklabError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let phone_number_url = format!(
            "{}/{}/{}",
            config.api_base_url.trim_end_matches('/'),
            config.api_version,
            phone_number_id
        );

        Ok(Self {
            client,
            renderer: Renderer::new(business),
            messages_url: format!("{phone_number_url}/messages"),
            phone_number_url,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    async fn post_once(&self, body: &serde_json::Value) -> Result<MessageId, Attempt> {
        let response = self
            .client
            .post(&self.messages_url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                Attempt::Transient(BlacklabError::Channel {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        debug!(status = %status, "graph api response received");

        if status.is_success() {
            let parsed: SendResponse = serde_json::from_str(&text).map_err(|e| {
                Attempt::Fatal(BlacklabError::Channel {
                    message: format!("failed to parse send response: {e}"),
                    source: Some(Box::new(e)),
                })
            })?;
            return parsed
                .messages
                .into_iter()
                .next()
                .map(|m| MessageId(m.id))
                .ok_or_else(|| {
                    Attempt::Fatal(BlacklabError::Channel {
                        message: "send response carried no message id".into(),
                        source: None,
                    })
                });
        }

        let message = match serde_json::from_str::<GraphErrorResponse>(&text) {
            Ok(err) => match err.error.code {
                Some(code) => format!("Graph API error {code} ({status}): {}", err.error.message),
                None => format!("Graph API error ({status}): {}", err.error.message),
            },
            Err(_) => format!("Graph API returned {status}: {text}"),
        };
        let err = BlacklabError::Channel {
            message,
            source: None,
        };
        if is_transient(status) {
            Err(Attempt::Transient(err))
        } else {
            Err(Attempt::Fatal(err))
        }
    }
}

enum Attempt {
    Transient(BlacklabError),
    Fatal(BlacklabError),
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, BlacklabError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BlacklabError::Config(format!(
            "{key} is required for the WhatsApp adapter"
        ))),
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BlacklabError> {
        match self
            .client
            .get(format!("{}?fields=id", self.phone_number_url))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Degraded(format!(
                "Graph API returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("Graph API unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), BlacklabError> {
        debug!("WhatsApp channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannel {
    async fn send(&self, to: &UserId, intent: &OutboundIntent) -> Result<MessageId, BlacklabError> {
        let body = self.renderer.render(to, intent);
        match self.post_once(&body).await {
            Ok(id) => Ok(id),
            Err(Attempt::Fatal(e)) => Err(e),
            Err(Attempt::Transient(e)) => {
                warn!(user = %to, intent = intent.kind(), error = %e, "transient send failure, retrying");
                tokio::time::sleep(self.retry_backoff).await;
                match self.post_once(&body).await {
                    Ok(id) => Ok(id),
                    Err(Attempt::Fatal(e) | Attempt::Transient(e)) => Err(e),
                }
            }
        }
    }
}
