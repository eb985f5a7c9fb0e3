// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mute list operations on `ignored_chats`.

use chrono::{SecondsFormat, Utc};
use nexos_core::NexosError;
use nexos_core::types::IgnoreEntry;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

pub async fn exists(db: &Database, chat_id: &str) -> Result<bool, NexosError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare_cached("SELECT 1 FROM ignored_chats WHERE chat_id = ?1")?;
            stmt.exists(params![chat_id])
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts the chat, or refreshes `added_by` and `created_at` if present.
pub async fn upsert(db: &Database, chat_id: &str, added_by: &str) -> Result<(), NexosError> {
    let chat_id = chat_id.to_string();
    let added_by = added_by.to_string();
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO ignored_chats (chat_id, added_by, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     added_by = excluded.added_by,
                     created_at = excluded.created_at",
                params![chat_id, added_by, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Returns the number of rows removed.
pub async fn delete(db: &Database, chat_id: &str) -> Result<u64, NexosError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM ignored_chats WHERE chat_id = ?1",
                params![chat_id],
            )?;
            Ok(removed as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Most recently muted first.
pub async fn list_recent(db: &Database, limit: usize) -> Result<Vec<IgnoreEntry>, NexosError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT chat_id, added_by, created_at FROM ignored_chats
                 ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(IgnoreEntry {
                    chat_id: row.get(0)?,
                    added_by: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
