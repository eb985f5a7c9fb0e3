// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat rate limit for the onboarding hint.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Remembers when each chat last got the hint.
///
/// Bounded by an LRU; an evicted chat may get its next hint early.
pub struct HintThrottle {
    interval: Duration,
    last_sent: Mutex<LruCache<String, Instant>>,
}

impl HintThrottle {
    pub fn new(interval: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            interval,
            last_sent: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Claims the hint slot for `chat_id`.
    ///
    /// Returns `true` and records `now` when the chat has not had a hint
    /// within the interval; otherwise leaves the record untouched.
    pub async fn try_acquire(&self, chat_id: &str, now: Instant) -> bool {
        let mut last_sent = self.last_sent.lock().await;
        if let Some(previous) = last_sent.get(chat_id)
            && now.saturating_duration_since(*previous) < self.interval
        {
            return false;
        }
        last_sent.put(chat_id.to_string(), now);
        true
    }

    pub async fn tracked(&self) -> usize {
        self.last_sent.lock().await.len()
    }
}
