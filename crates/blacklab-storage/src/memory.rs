// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process storage for tests and single-instance deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use blacklab_core::{
    AdapterType, BlacklabError, Category, ConversationSession, HealthStatus, Order, OrderId,
    OrderStatus, OrderStore, Package, PackageCatalog, PackageId, PluginAdapter, SessionStore,
    StorageAdapter, UserDirectory, UserId,
};

/// Map-backed implementation of the catalog, session, order and user traits.
#[derive(Default)]
pub struct MemoryStore {
    packages: RwLock<Vec<Package>>,
    sessions: RwLock<HashMap<UserId, ConversationSession>>,
    orders: RwLock<Vec<Order>>,
    users: RwLock<Vec<UserId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with `packages`.
    pub fn with_packages(packages: Vec<Package>) -> Self {
        Self {
            packages: RwLock::new(packages),
            ..Self::default()
        }
    }

    pub async fn add_package(&self, package: Package) -> Result<(), BlacklabError> {
        package.validate()?;
        let mut packages = self.packages.write().await;
        if packages.iter().any(|p| p.id == package.id) {
            return Err(BlacklabError::InvalidPackage(format!(
                "duplicate package id {}",
                package.id
            )));
        }
        packages.push(package);
        Ok(())
    }

    pub async fn remove_package(&self, id: &PackageId) -> Result<(), BlacklabError> {
        let mut packages = self.packages.write().await;
        let before = packages.len();
        packages.retain(|p| &p.id != id);
        if packages.len() == before {
            return Err(BlacklabError::NotFound {
                kind: "package",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BlacklabError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BlacklabError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStore {
    async fn initialize(&self) -> Result<(), BlacklabError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), BlacklabError> {
        Ok(())
    }
}

#[async_trait]
impl PackageCatalog for MemoryStore {
    async fn list_by_category(&self, category: Category) -> Result<Vec<Package>, BlacklabError> {
        Ok(self
            .packages
            .read()
            .await
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Package>, BlacklabError> {
        Ok(self.packages.read().await.clone())
    }

    async fn get_by_id(&self, id: &PackageId) -> Result<Option<Package>, BlacklabError> {
        Ok(self
            .packages
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, user: &UserId) -> Result<Option<ConversationSession>, BlacklabError> {
        Ok(self.sessions.read().await.get(user).cloned())
    }

    async fn save(&self, session: &ConversationSession) -> Result<(), BlacklabError> {
        self.sessions
            .write()
            .await
            .insert(session.user_id.clone(), session.clone());
        Ok(())
    }

    async fn remove(&self, user: &UserId) -> Result<(), BlacklabError> {
        self.sessions.write().await.remove(user);
        Ok(())
    }

    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> Result<usize, BlacklabError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_activity_at >= cutoff);
        Ok(before - sessions.len())
    }

    async fn clear(&self) -> Result<(), BlacklabError> {
        self.sessions.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, BlacklabError> {
        Ok(self.sessions.read().await.len())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create(&self, order: &Order) -> Result<(), BlacklabError> {
        let mut orders = self.orders.write().await;
        if orders.iter().any(|o| o.id == order.id) {
            return Err(BlacklabError::storage(format!("duplicate order id {}", order.id)));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, BlacklabError> {
        Ok(self.orders.read().await.iter().find(|o| &o.id == id).cloned())
    }

    async fn list(&self, limit: usize) -> Result<Vec<Order>, BlacklabError> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, BlacklabError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| BlacklabError::NotFound {
                kind: "order",
                id: id.to_string(),
            })?;
        order.transition_to(status)?;
        Ok(order.clone())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn record(&self, user: &UserId, _seen_at: DateTime<Utc>) -> Result<bool, BlacklabError> {
        let mut users = self.users.write().await;
        if users.contains(user) {
            return Ok(false);
        }
        users.push(user.clone());
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<UserId>, BlacklabError> {
        Ok(self.users.read().await.clone())
    }
}
