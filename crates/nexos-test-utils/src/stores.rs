// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage doubles.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio::sync::Mutex;

use nexos_core::types::{AuthState, IgnoreEntry, KeyUpdate, StoredKey};
use nexos_core::{AuthStateStore, IgnoreStore, NexosError};

/// Mute list kept in insertion order (newest last).
#[derive(Default)]
pub struct InMemoryIgnoreStore {
    entries: Mutex<Vec<IgnoreEntry>>,
    fail: AtomicBool,
}

impl InMemoryIgnoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail.
    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), NexosError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NexosError::Storage {
                source: "mock storage failure".into(),
            });
        }
        Ok(())
    }

    pub async fn chat_ids(&self) -> Vec<String> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|e| e.chat_id.clone())
            .collect()
    }
}

#[async_trait]
impl IgnoreStore for InMemoryIgnoreStore {
    async fn exists(&self, chat_id: &str) -> Result<bool, NexosError> {
        self.check()?;
        Ok(self.entries.lock().await.iter().any(|e| e.chat_id == chat_id))
    }

    async fn upsert(&self, chat_id: &str, added_by: &str) -> Result<(), NexosError> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        entries.retain(|e| e.chat_id != chat_id);
        entries.push(IgnoreEntry {
            chat_id: chat_id.to_string(),
            added_by: added_by.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        Ok(())
    }

    async fn delete(&self, chat_id: &str) -> Result<u64, NexosError> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.chat_id != chat_id);
        Ok((before - entries.len()) as u64)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<IgnoreEntry>, NexosError> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Credential store double.
#[derive(Default)]
pub struct InMemoryAuthStore {
    creds: Mutex<Option<serde_json::Value>>,
    keys: Mutex<BTreeMap<(String, String), serde_json::Value>>,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStateStore for InMemoryAuthStore {
    async fn load(&self) -> Result<AuthState, NexosError> {
        let creds = self.creds.lock().await.clone();
        let keys = self
            .keys
            .lock()
            .await
            .iter()
            .map(|((key_type, id), value)| StoredKey {
                key_type: key_type.clone(),
                id: id.clone(),
                value: value.clone(),
            })
            .collect();
        Ok(AuthState { creds, keys })
    }

    async fn save_creds(&self, creds: &serde_json::Value) -> Result<(), NexosError> {
        *self.creds.lock().await = Some(creds.clone());
        Ok(())
    }

    async fn apply_key_updates(&self, updates: &[KeyUpdate]) -> Result<(), NexosError> {
        let mut keys = self.keys.lock().await;
        for update in updates {
            let slot = (update.key_type.clone(), update.id.clone());
            match &update.value {
                Some(value) => {
                    keys.insert(slot, value.clone());
                }
                None => {
                    keys.remove(&slot);
                }
            }
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), NexosError> {
        *self.creds.lock().await = None;
        self.keys.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ignore_store_lists_newest_first() {
        let store = InMemoryIgnoreStore::new();
        store.upsert("a", "wa-admin").await.unwrap();
        store.upsert("b", "wa-admin").await.unwrap();
        store.upsert("a", "wa-admin").await.unwrap();
        let ids: Vec<_> = store
            .list_recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.chat_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.delete("a").await.unwrap(), 1);
        assert_eq!(store.delete("a").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn auth_store_applies_deletions() {
        let store = InMemoryAuthStore::new();
        store
            .apply_key_updates(&[KeyUpdate {
                key_type: "pre-key".into(),
                id: "1".into(),
                value: Some(serde_json::json!(1)),
            }])
            .await
            .unwrap();
        store
            .apply_key_updates(&[KeyUpdate {
                key_type: "pre-key".into(),
                id: "1".into(),
                value: None,
            }])
            .await
            .unwrap();
        assert!(store.load().await.unwrap().keys.is_empty());
    }
}
