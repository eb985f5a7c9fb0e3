// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic testing.
//!
//! `MockTransport` implements `Transport` and records every outbound send
//! for assertion in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use nexos_core::traits::PluginAdapter;
use nexos_core::types::{AdapterType, GroupMetadata, HealthStatus, MessageId, OutboundContent, SendOptions};
use nexos_core::{NexosError, Transport};

/// One captured `send_message` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: String,
    pub content: OutboundContent,
    pub options: SendOptions,
}

impl SentMessage {
    /// Text of a text message, `None` for other kinds.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            OutboundContent::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

pub struct MockTransport {
    self_id: Option<String>,
    sent: Mutex<Vec<SentMessage>>,
    groups: Mutex<HashMap<String, GroupMetadata>>,
    fail_sends: AtomicBool,
    fail_images: AtomicBool,
    next_id: AtomicU64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            self_id: None,
            sent: Mutex::new(Vec::new()),
            groups: Mutex::new(HashMap::new()),
            fail_sends: AtomicBool::new(false),
            fail_images: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_self_id(mut self, jid: impl Into<String>) -> Self {
        self.self_id = Some(jid.into());
        self
    }

    /// Makes every following send fail (or succeed again).
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Rejects image sends only, as a bridge does for an oversized upload.
    pub fn fail_images(&self, fail: bool) {
        self.fail_images.store(fail, Ordering::SeqCst);
    }

    pub async fn set_group(&self, metadata: GroupMetadata) {
        self.groups.lock().await.insert(metadata.id.clone(), metadata);
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Texts of all text sends, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|m| m.text().map(str::to_string))
            .collect()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn self_id(&self) -> Option<String> {
        self.self_id.clone()
    }

    async fn send_message(
        &self,
        chat_id: &str,
        content: OutboundContent,
        options: SendOptions,
    ) -> Result<MessageId, NexosError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(NexosError::transport("mock send failure"));
        }
        if matches!(content, OutboundContent::Image { .. }) && self.fail_images.load(Ordering::SeqCst) {
            return Err(NexosError::transport("mock image send failure"));
        }
        self.sent.lock().await.push(SentMessage {
            chat_id: chat_id.to_string(),
            content,
            options,
        });
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(MessageId(format!("mock-{id}")))
    }

    async fn group_metadata(&self, group_id: &str) -> Result<GroupMetadata, NexosError> {
        self.groups
            .lock()
            .await
            .get(group_id)
            .cloned()
            .ok_or_else(|| NexosError::transport(format!("unknown group {group_id}")))
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, NexosError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NexosError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_sends_in_order() {
        let transport = MockTransport::new();
        transport
            .send_message("a", OutboundContent::text("one"), SendOptions::default())
            .await
            .unwrap();
        transport
            .send_message("b", OutboundContent::text("two"), SendOptions::default())
            .await
            .unwrap();
        assert_eq!(transport.sent_texts().await, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn failing_sends_are_not_captured() {
        let transport = MockTransport::new();
        transport.fail_sends(true);
        assert!(
            transport
                .send_message("a", OutboundContent::text("x"), SendOptions::default())
                .await
                .is_err()
        );
        assert_eq!(transport.sent_count().await, 0);
    }
}
