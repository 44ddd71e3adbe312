// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for BlackLab integration tests.
//!
//! Provides mock adapters and a harness for fast, deterministic tests
//! without a WhatsApp account or network access.
//!
//! # Components
//!
//! - [`MockChannel`] - records every sent intent, with injectable failures
//! - [`TestHarness`] - engine wired to in-memory or temp-SQLite storage and a [`MockChannel`]

pub mod harness;
pub mod mock_channel;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::MockChannel;
