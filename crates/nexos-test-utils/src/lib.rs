// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Nexos integration tests.
//!
//! Provides in-memory doubles for every collaborator the gateway core talks
//! to, so routing and supervision can be tested deterministically without a
//! bridge, a database or Telegram.
//!
//! # Components
//!
//! - [`MockTransport`] - captures outbound sends, can fail on demand
//! - [`MockSessionFactory`] - hands out sessions whose event senders tests drive
//! - [`InMemoryIgnoreStore`] / [`InMemoryAuthStore`] - storage doubles
//! - [`MockRelay`] - captures admin relay traffic
//! - [`builders`] - inbound message constructors

pub mod builders;
pub mod mock_relay;
pub mod mock_session;
pub mod mock_transport;
pub mod stores;

pub use mock_relay::MockRelay;
pub use mock_session::MockSessionFactory;
pub use mock_transport::{MockTransport, SentMessage};
pub use stores::{InMemoryAuthStore, InMemoryIgnoreStore};

use std::time::Duration;

/// Polls `check` every few milliseconds until it holds or `timeout` passes.
///
/// Returns whether the condition was met.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
