// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the BlackLab ordering bot.

use thiserror::Error;

use crate::order::OrderStatus;

/// The primary error type used across adapter traits and core operations.
#[derive(Debug, Error)]
pub enum BlacklabError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging gateway errors (network failure, provider rejection).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A webhook payload could not be understood.
    #[error("malformed webhook payload: {0}")]
    Webhook(String),

    /// A package record violates the catalog invariants.
    #[error("invalid package: {0}")]
    InvalidPackage(String),

    /// An order status change outside `pending -> confirmed|failed`.
    #[error("invalid order status transition: {from} -> {to}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },

    /// A record looked up by id does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BlacklabError {
    /// Shorthand for wrapping any error as a storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        BlacklabError::Storage {
            source: source.into(),
        }
    }
}
