// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud API webhook payloads and the subscription handshake.
//!
//! Only the fields the bot acts on are modelled; everything else in the
//! payload (contacts, metadata, delivery statuses) is ignored.

use blacklab_core::{BlacklabError, InboundEvent, InboundKind, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `object` value of WhatsApp Business deliveries.
pub const WHATSAPP_OBJECT: &str = "whatsapp_business_account";

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

/// One message as delivered by the Cloud API.
#[derive(Debug, Deserialize)]
pub struct WireMessage {
    pub id: String,
    pub from: String,
    /// Unix seconds, as a string.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<WireText>,
    #[serde(default)]
    pub interactive: Option<WireInteractive>,
    /// Quick-reply buttons on template messages.
    #[serde(default)]
    pub button: Option<WireButton>,
}

#[derive(Debug, Deserialize)]
pub struct WireText {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct WireInteractive {
    #[serde(default)]
    pub button_reply: Option<WireReply>,
    #[serde(default)]
    pub list_reply: Option<WireReply>,
}

#[derive(Debug, Deserialize)]
pub struct WireReply {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct WireButton {
    pub payload: String,
}

/// Parses a raw webhook body.
pub fn parse_webhook(body: &[u8]) -> Result<WebhookPayload, BlacklabError> {
    serde_json::from_slice(body).map_err(|e| BlacklabError::Webhook(e.to_string()))
}

impl WebhookPayload {
    pub fn is_whatsapp(&self) -> bool {
        self.object == WHATSAPP_OBJECT
    }

    /// Flattens every message in the delivery into inbound events, ordered
    /// by provider timestamp. The sort is stable, so messages sharing a
    /// timestamp keep their payload order.
    pub fn into_events(self) -> Vec<InboundEvent> {
        let mut events: Vec<InboundEvent> = self
            .entry
            .into_iter()
            .flat_map(|entry| entry.changes)
            .flat_map(|change| change.value.messages)
            .map(WireMessage::into_event)
            .collect();
        events.sort_by_key(|e| e.timestamp);
        events
    }
}

impl WireMessage {
    fn into_event(self) -> InboundEvent {
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|t| t.parse::<i64>().ok())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        let kind = match (self.kind.as_str(), self.text, self.interactive, self.button) {
            ("text", Some(text), _, _) => InboundKind::FreeText { text: text.body },
            ("interactive", _, Some(interactive), _) => {
                match (interactive.button_reply, interactive.list_reply) {
                    (Some(reply), _) => InboundKind::ButtonReply { id: reply.id },
                    (None, Some(reply)) => InboundKind::ListReply { id: reply.id },
                    (None, None) => InboundKind::Unknown,
                }
            }
            ("button", _, _, Some(button)) => InboundKind::ButtonReply { id: button.payload },
            _ => InboundKind::Unknown,
        };

        InboundEvent {
            id: MessageId(self.id),
            from: UserId(self.from),
            timestamp,
            kind,
        }
    }
}

/// Query parameters of the `GET /webhook` verification request.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

impl SubscriptionQuery {
    /// Returns the challenge to echo when the request is a subscribe call
    /// carrying `expected_token`. No configured token means no handshake
    /// can succeed.
    pub fn verify(&self, expected_token: Option<&str>) -> Option<&str> {
        let expected = expected_token.filter(|t| !t.is_empty())?;
        if self.mode.as_deref() != Some("subscribe") {
            return None;
        }
        if self.verify_token.as_deref() != Some(expected) {
            return None;
        }
        self.challenge.as_deref()
    }
}
