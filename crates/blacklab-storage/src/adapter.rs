// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed implementation of every storage trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use blacklab_config::model::StorageConfig;
use blacklab_core::{
    AdapterType, BlacklabError, Category, ConversationSession, HealthStatus, Order, OrderId,
    OrderStatus, OrderStore, Package, PackageCatalog, PackageId, PluginAdapter, SessionStore,
    StorageAdapter, UserDirectory, UserId,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite storage. The database is opened lazily by [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, BlacklabError> {
        self.db.get().ok_or_else(|| {
            BlacklabError::storage("storage not initialized; call initialize() first")
        })
    }

    pub async fn add_package(&self, package: &Package) -> Result<(), BlacklabError> {
        queries::packages::insert(self.db()?, package).await?;
        info!(package = %package.id, category = %package.category, "package added");
        Ok(())
    }

    pub async fn remove_package(&self, id: &PackageId) -> Result<(), BlacklabError> {
        if !queries::packages::remove(self.db()?, id).await? {
            return Err(BlacklabError::NotFound {
                kind: "package",
                id: id.to_string(),
            });
        }
        info!(package = %id, "package removed");
        Ok(())
    }

    /// Adds the default bundles that are not already in the catalog.
    pub async fn seed_defaults(&self) -> Result<usize, BlacklabError> {
        let added =
            queries::packages::insert_missing(self.db()?, crate::seed::default_packages()).await?;
        info!(added, "catalog seeded");
        Ok(added)
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), BlacklabError> {
        db.connection()
            .call(|conn| -> rusqlite::Result<()> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BlacklabError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let probe = db
            .connection()
            .call(|conn| -> rusqlite::Result<i64> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await;
        Ok(match probe {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), BlacklabError> {
        match self.db.get() {
            Some(db) => self.checkpoint(db).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), BlacklabError> {
        self.db
            .get_or_try_init(|| Database::open(&self.config.database_path, self.config.wal_mode))
            .await?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), BlacklabError> {
        self.checkpoint(self.db()?).await
    }
}

#[async_trait]
impl PackageCatalog for SqliteStorage {
    async fn list_by_category(&self, category: Category) -> Result<Vec<Package>, BlacklabError> {
        queries::packages::list_by_category(self.db()?, category).await
    }

    async fn list_all(&self) -> Result<Vec<Package>, BlacklabError> {
        queries::packages::list_all(self.db()?).await
    }

    async fn get_by_id(&self, id: &PackageId) -> Result<Option<Package>, BlacklabError> {
        queries::packages::get(self.db()?, id).await
    }
}

#[async_trait]
impl SessionStore for SqliteStorage {
    async fn load(&self, user: &UserId) -> Result<Option<ConversationSession>, BlacklabError> {
        queries::sessions::load(self.db()?, user).await
    }

    async fn save(&self, session: &ConversationSession) -> Result<(), BlacklabError> {
        queries::sessions::save(self.db()?, session).await
    }

    async fn remove(&self, user: &UserId) -> Result<(), BlacklabError> {
        queries::sessions::remove(self.db()?, user).await
    }

    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> Result<usize, BlacklabError> {
        queries::sessions::evict_idle(self.db()?, cutoff).await
    }

    async fn clear(&self) -> Result<(), BlacklabError> {
        queries::sessions::clear(self.db()?).await
    }

    async fn count(&self) -> Result<usize, BlacklabError> {
        queries::sessions::count(self.db()?).await
    }
}

#[async_trait]
impl OrderStore for SqliteStorage {
    async fn create(&self, order: &Order) -> Result<(), BlacklabError> {
        queries::orders::create(self.db()?, order).await
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, BlacklabError> {
        queries::orders::get(self.db()?, id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<Order>, BlacklabError> {
        queries::orders::list(self.db()?, limit).await
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, BlacklabError> {
        let order = queries::orders::update_status(self.db()?, id, status).await?;
        info!(order_id = %id, %status, "order status updated");
        Ok(order)
    }
}

#[async_trait]
impl UserDirectory for SqliteStorage {
    async fn record(&self, user: &UserId, seen_at: DateTime<Utc>) -> Result<bool, BlacklabError> {
        queries::users::record(self.db()?, user, seen_at).await
    }

    async fn list(&self) -> Result<Vec<UserId>, BlacklabError> {
        queries::users::list(self.db()?).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn adapter_identity() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir.path().join("t.db")));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn queries_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir.path().join("t.db")));
        assert!(storage.list_all().await.is_err());
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_creates_file_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/blacklab.db");
        let storage = SqliteStorage::new(config(&path));
        storage.initialize().await.unwrap();
        storage.initialize().await.unwrap();
        assert!(path.exists());
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn seeding_twice_adds_nothing_new() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir.path().join("t.db")));
        storage.initialize().await.unwrap();
        assert_eq!(storage.seed_defaults().await.unwrap(), 6);
        assert_eq!(storage.seed_defaults().await.unwrap(), 0);
        assert_eq!(storage.list_all().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn removing_unknown_package_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir.path().join("t.db")));
        storage.initialize().await.unwrap();
        let err = storage
            .remove_package(&PackageId::from("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlacklabError::NotFound { kind: "package", .. }));
    }
}
