// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finalized purchase intents.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BlacklabError;
use crate::phone::PhoneNumber;
use crate::types::{Package, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn generate() -> Self {
        OrderId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payment state of an order. Only `pending -> confirmed|failed` is allowed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Failed,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Failed)
        )
    }
}

/// An order created when a user confirms a purchase.
///
/// The package is a snapshot taken at selection time, so later catalog
/// edits or deletions do not change what was bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer: UserId,
    pub package: Package,
    pub payer: PhoneNumber,
    pub recipient: PhoneNumber,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn pending(
        buyer: UserId,
        package: Package,
        payer: PhoneNumber,
        recipient: PhoneNumber,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            buyer,
            package,
            payer,
            recipient,
            status: OrderStatus::Pending,
            created_at: now,
        }
    }

    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), BlacklabError> {
        if !self.status.can_transition_to(next) {
            return Err(BlacklabError::InvalidOrderTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
