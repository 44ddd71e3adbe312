// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging gateway trait.

use async_trait::async_trait;

use crate::error::BlacklabError;
use crate::message::OutboundIntent;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MessageId, UserId};

/// Delivers outbound intents to a user.
///
/// Implementations own the wire format: the engine hands over an
/// [`OutboundIntent`] and never sees provider JSON. Transient failures
/// should be retried inside `send`; an `Err` means the message was not
/// delivered.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    async fn send(&self, to: &UserId, intent: &OutboundIntent) -> Result<MessageId, BlacklabError>;
}
