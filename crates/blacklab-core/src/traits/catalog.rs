// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only package lookup used by the conversation engine.

use async_trait::async_trait;

use crate::error::BlacklabError;
use crate::types::{Category, Package, PackageId};

#[async_trait]
pub trait PackageCatalog: Send + Sync {
    /// Packages in `category`, in insertion order.
    async fn list_by_category(&self, category: Category) -> Result<Vec<Package>, BlacklabError>;

    /// Every package, grouped in insertion order.
    async fn list_all(&self) -> Result<Vec<Package>, BlacklabError>;

    /// `Ok(None)` when the package does not exist (for example deleted mid-flow).
    async fn get_by_id(&self, id: &PackageId) -> Result<Option<Package>, BlacklabError>;
}
