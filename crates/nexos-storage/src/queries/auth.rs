// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport credential and signal key persistence.
//!
//! Values are opaque JSON documents stored as text.

use chrono::{SecondsFormat, Utc};
use nexos_core::NexosError;
use nexos_core::types::{AuthState, KeyUpdate, StoredKey};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

fn json_err(e: serde_json::Error) -> NexosError {
    NexosError::Storage { source: Box::new(e) }
}

pub async fn load(db: &Database) -> Result<AuthState, NexosError> {
    let (creds, keys) = db
        .connection()
        .call(|conn| {
            let creds: Option<String> = conn
                .query_row("SELECT data FROM auth_creds WHERE id = 'creds'", [], |row| {
                    row.get(0)
                })
                .optional()?;
            let mut stmt = conn.prepare("SELECT type, id, value FROM auth_keys ORDER BY type, id")?;
            let keys = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok((creds, keys))
        })
        .await
        .map_err(map_tr_err)?;

    let creds = creds
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(json_err)?;
    let keys = keys
        .into_iter()
        .map(|(key_type, id, raw)| {
            Ok(StoredKey {
                key_type,
                id,
                value: serde_json::from_str(&raw).map_err(json_err)?,
            })
        })
        .collect::<Result<Vec<_>, NexosError>>()?;

    Ok(AuthState { creds, keys })
}

pub async fn save_creds(db: &Database, creds: &serde_json::Value) -> Result<(), NexosError> {
    let data = serde_json::to_string(creds).map_err(json_err)?;
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO auth_creds (id, data, updated_at) VALUES ('creds', ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                params![data, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Upserts keys with a value and deletes keys without one, atomically.
pub async fn apply_key_updates(db: &Database, updates: &[KeyUpdate]) -> Result<(), NexosError> {
    if updates.is_empty() {
        return Ok(());
    }
    let rows = updates
        .iter()
        .map(|u| {
            let value = u.value.as_ref().map(serde_json::to_string).transpose()?;
            Ok((u.key_type.clone(), u.id.clone(), value))
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()
        .map_err(json_err)?;

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut upsert = tx.prepare_cached(
                    "INSERT INTO auth_keys (type, id, value) VALUES (?1, ?2, ?3)
                     ON CONFLICT(type, id) DO UPDATE SET value = excluded.value",
                )?;
                let mut remove = tx.prepare_cached("DELETE FROM auth_keys WHERE type = ?1 AND id = ?2")?;
                for (key_type, id, value) in &rows {
                    match value {
                        Some(value) => upsert.execute(params![key_type, id, value])?,
                        None => remove.execute(params![key_type, id])?,
                    };
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn clear(db: &Database) -> Result<(), NexosError> {
    db.connection()
        .call(|conn| {
            conn.execute_batch("DELETE FROM auth_creds; DELETE FROM auth_keys;")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
