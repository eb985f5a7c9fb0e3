// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport session interfaces.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::NexosError;
use crate::types::{
    AuthState, GroupMetadata, MessageId, OutboundContent, SendOptions, TransportEvent,
};

/// Send-side handle of a live transport session.
///
/// Shared by the router and command handlers. Only the bot loop may replace
/// the session behind it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// JID of the bot's own account, once known.
    fn self_id(&self) -> Option<String>;

    async fn send_message(
        &self,
        chat_id: &str,
        content: OutboundContent,
        options: SendOptions,
    ) -> Result<MessageId, NexosError>;

    async fn group_metadata(&self, group_id: &str) -> Result<GroupMetadata, NexosError>;
}

/// A freshly created session: its send handle plus the ordered event stream.
///
/// The stream ends when the session is gone for good; a close is also
/// announced through a `connection.update` event beforehand when known.
pub struct Session {
    pub transport: Arc<dyn Transport>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Creates transport sessions. Called once at startup and again on every reconnect.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create_session(&self, auth: AuthState) -> Result<Session, NexosError>;
}
