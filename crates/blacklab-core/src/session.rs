// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user conversation state.
//!
//! Each [`FlowState`] variant carries exactly the data that state requires,
//! so a session waiting for a recipient number cannot exist without a
//! selected package and a payer number.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::phone::PhoneNumber;
use crate::types::{Category, Package, UserId};

/// Where a user currently is in the ordering flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "state", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlowState {
    Idle,
    ChoosingCategory,
    ChoosingPackage {
        category: Category,
    },
    AwaitingPayerNumber {
        package: Package,
    },
    AwaitingRecipientNumber {
        package: Package,
        payer: PhoneNumber,
    },
    AwaitingConfirmation {
        package: Package,
        payer: PhoneNumber,
        recipient: PhoneNumber,
    },
}

impl FlowState {
    /// Stable snake_case name, used in logs and the admin API.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, FlowState::Idle)
    }
}

/// One user's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub user_id: UserId,
    pub state: FlowState,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// Provider timestamp of the newest event applied to this session.
    #[serde(default)]
    pub last_event_at: Option<DateTime<Utc>>,
}

impl ConversationSession {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            state: FlowState::Idle,
            created_at: now,
            last_activity_at: now,
            last_event_at: None,
        }
    }

    pub fn selected_package(&self) -> Option<&Package> {
        match &self.state {
            FlowState::AwaitingPayerNumber { package }
            | FlowState::AwaitingRecipientNumber { package, .. }
            | FlowState::AwaitingConfirmation { package, .. } => Some(package),
            _ => None,
        }
    }

    pub fn payer_number(&self) -> Option<&PhoneNumber> {
        match &self.state {
            FlowState::AwaitingRecipientNumber { payer, .. }
            | FlowState::AwaitingConfirmation { payer, .. } => Some(payer),
            _ => None,
        }
    }

    pub fn recipient_number(&self) -> Option<&PhoneNumber> {
        match &self.state {
            FlowState::AwaitingConfirmation { recipient, .. } => Some(recipient),
            _ => None,
        }
    }

    /// True when the session has been inactive for longer than `timeout`.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        match chrono::Duration::from_std(timeout) {
            Ok(timeout) => now - self.last_activity_at > timeout,
            Err(_) => false,
        }
    }

    /// Drops any in-progress flow, keeping identity and event watermark.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.state = FlowState::Idle;
        self.created_at = now;
        self.last_activity_at = now;
    }
}
