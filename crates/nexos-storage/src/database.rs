// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use nexos_core::NexosError;
use tracing::debug;

use crate::migrations;

/// Handle to the single SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database file, applies PRAGMAs and
    /// runs pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, NexosError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| NexosError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| NexosError::Storage {
                source: e.to_string().into(),
            })?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// In-memory database with the full schema.
    pub async fn open_in_memory() -> Result<Self, NexosError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| NexosError::Storage {
                source: e.to_string().into(),
            })?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), NexosError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                        row.get::<_, String>(0)
                    })?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| -> Result<(), NexosError> { migrations::run_migrations(conn) })
            .await
            .map_err(|e| NexosError::Storage {
                source: e.to_string().into(),
            })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

/// Maps a tokio-rusqlite call failure into the storage error variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> NexosError {
    NexosError::Storage {
        source: e.to_string().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/nexos.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();

        for table in ["auth_creds", "auth_keys", "ignored_chats"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}: {tables:?}");
        }
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nexos.db");
        let path = path.to_str().unwrap();
        drop(Database::open(path, true).await.unwrap());
        assert!(Database::open(path, true).await.is_ok());
    }

    #[tokio::test]
    async fn wal_mode_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
