// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for the BlackLab ordering bot.
//!
//! [`SqliteStorage`] is the production backend: WAL-mode SQLite with
//! embedded migrations and a single writer thread via `tokio-rusqlite`.
//! [`MemoryStore`] implements the same traits over in-process maps for
//! tests and small deployments.

pub mod adapter;
pub mod database;
pub mod memory;
pub mod migrations;
pub mod queries;
pub mod seed;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use memory::MemoryStore;
pub use seed::default_packages;
