// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The BlackLab ordering conversation.
//!
//! [`transition`] is the pure state machine. [`ConversationEngine`] wraps it
//! with persistence, dedup and per-user locking; [`Dispatcher`] feeds it in
//! per-user arrival order and [`spawn_sweeper`] evicts idle sessions.

pub mod dedup;
pub mod dispatcher;
pub mod engine;
pub mod metrics;
pub mod sweep;
pub mod transition;

#[cfg(test)]
mod proptests;

pub use dedup::DedupCache;
pub use dispatcher::Dispatcher;
pub use engine::{ConversationEngine, EngineConfig, EngineStores, HandleOutcome};
pub use metrics::register_metrics;
pub use sweep::spawn_sweeper;
pub use transition::{CatalogAnswer, Effect, FlowContext, Lookup, TransitionResult, lookup_for, transition};
