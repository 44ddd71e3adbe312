// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP front door of the BlackLab ordering bot.
//!
//! Receives WhatsApp webhook deliveries, hands their events to the
//! per-user [`Dispatcher`](blacklab_flow::Dispatcher), and exposes a health
//! probe plus a small read-only admin API.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{AdminStores, GatewayState, HealthState, WebhookConfig, router, start_server};
