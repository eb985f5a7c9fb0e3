// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence interfaces consumed by the router and the bot loop.

use async_trait::async_trait;

use crate::error::NexosError;
use crate::types::{AuthState, IgnoreEntry, KeyUpdate};

/// Per-chat mute list.
#[async_trait]
pub trait IgnoreStore: Send + Sync {
    async fn exists(&self, chat_id: &str) -> Result<bool, NexosError>;

    /// Inserts the chat or refreshes `added_by` if it is already muted.
    async fn upsert(&self, chat_id: &str, added_by: &str) -> Result<(), NexosError>;

    /// Removes the chat. Returns the number of rows removed (0 or 1).
    async fn delete(&self, chat_id: &str) -> Result<u64, NexosError>;

    /// Most recently muted chats first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<IgnoreEntry>, NexosError>;
}

/// Storage for the transport's session credentials and signal keys.
#[async_trait]
pub trait AuthStateStore: Send + Sync {
    async fn load(&self) -> Result<AuthState, NexosError>;

    async fn save_creds(&self, creds: &serde_json::Value) -> Result<(), NexosError>;

    /// Applies key upserts and deletions in one transaction.
    async fn apply_key_updates(&self, updates: &[KeyUpdate]) -> Result<(), NexosError>;

    /// Forgets the session entirely so the next start issues a new login challenge.
    async fn clear(&self) -> Result<(), NexosError>;
}
