// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the BlackLab ordering bot.
//!
//! Domain types, the shared error type, phone validation and the adapter
//! traits every other crate in the workspace builds on.

pub mod error;
pub mod message;
pub mod order;
pub mod phone;
pub mod session;
pub mod traits;
pub mod types;

pub use error::BlacklabError;
pub use message::{InboundEvent, InboundKind, OutboundIntent, PromptReason};
pub use order::{Order, OrderId, OrderStatus};
pub use phone::{PhoneError, PhoneNumber};
pub use session::{ConversationSession, FlowState};
pub use types::{AdapterType, Category, HealthStatus, MessageId, Package, PackageId, UserId};

pub use traits::{
    ChannelAdapter, OrderStore, PackageCatalog, PluginAdapter, SessionStore, StorageAdapter,
    UserDirectory,
};
