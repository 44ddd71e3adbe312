// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Channel and storage adapters extend the [`PluginAdapter`] base trait and
//! use `#[async_trait]` so they can be held as trait objects.

pub mod adapter;
pub mod catalog;
pub mod channel;
pub mod storage;

pub use adapter::PluginAdapter;
pub use catalog::PackageCatalog;
pub use channel::ChannelAdapter;
pub use storage::{OrderStore, SessionStore, StorageAdapter, UserDirectory};
