// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries, one module per table.

pub mod orders;
pub mod packages;
pub mod sessions;
pub mod users;
