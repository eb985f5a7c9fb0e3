// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the mute list and credential store.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use nexos_config::model::StorageConfig;
use nexos_core::types::{AuthState, IgnoreEntry, KeyUpdate};
use nexos_core::{AdapterType, AuthStateStore, HealthStatus, IgnoreStore, NexosError, PluginAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`SqliteStorage::initialize`]; every
/// other call fails until then.
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

    /// Opens the database and runs migrations.
    pub async fn initialize(&self) -> Result<(), NexosError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| NexosError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, NexosError> {
        self.db.get().ok_or_else(|| NexosError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
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

    async fn health_check(&self) -> Result<HealthStatus, NexosError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NexosError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl IgnoreStore for SqliteStorage {
    async fn exists(&self, chat_id: &str) -> Result<bool, NexosError> {
        queries::ignore::exists(self.db()?, chat_id).await
    }

    async fn upsert(&self, chat_id: &str, added_by: &str) -> Result<(), NexosError> {
        queries::ignore::upsert(self.db()?, chat_id, added_by).await
    }

    async fn delete(&self, chat_id: &str) -> Result<u64, NexosError> {
        queries::ignore::delete(self.db()?, chat_id).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<IgnoreEntry>, NexosError> {
        queries::ignore::list_recent(self.db()?, limit).await
    }
}

#[async_trait]
impl AuthStateStore for SqliteStorage {
    async fn load(&self) -> Result<AuthState, NexosError> {
        queries::auth::load(self.db()?).await
    }

    async fn save_creds(&self, creds: &serde_json::Value) -> Result<(), NexosError> {
        queries::auth::save_creds(self.db()?, creds).await
    }

    async fn apply_key_updates(&self, updates: &[KeyUpdate]) -> Result<(), NexosError> {
        queries::auth::apply_key_updates(self.db()?, updates).await
    }

    async fn clear(&self) -> Result<(), NexosError> {
        queries::auth::clear(self.db()?).await
    }
}
