// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp transport for the Nexos gateway.
//!
//! The WhatsApp protocol itself is spoken by a sidecar process; this crate
//! talks to that sidecar over a WebSocket using the JSON frames in
//! [`protocol`]. Each call to [`SessionFactory::create_session`] opens a new
//! socket, hands the stored auth state over in a `hello` frame, and returns
//! the send handle together with the ordered event stream.

pub mod protocol;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use nexos_config::model::BridgeConfig;
use nexos_core::types::{AdapterType, AuthState, HealthStatus};
use nexos_core::{NexosError, PluginAdapter, Session, SessionFactory};
use tokio::sync::Mutex;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use protocol::{InboundFrame, OutboundFrame};
pub use session::BridgeTransport;

/// Opens bridge sessions and tracks the live one.
pub struct BridgeSessionFactory {
    config: BridgeConfig,
    current: Mutex<Option<CancellationToken>>,
}

impl BridgeSessionFactory {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            current: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl SessionFactory for BridgeSessionFactory {
    async fn create_session(&self, auth: AuthState) -> Result<Session, NexosError> {
        // Only one session talks to the bridge at a time.
        if let Some(previous) = self.current.lock().await.take() {
            previous.cancel();
        }

        let connect_timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let (socket, _) = tokio::time::timeout(connect_timeout, connect_async(self.config.url.as_str()))
            .await
            .map_err(|_| NexosError::Timeout {
                duration: connect_timeout,
            })?
            .map_err(|e| NexosError::Transport {
                message: format!("failed to connect to bridge at {}", self.config.url),
                source: Some(Box::new(e)),
            })?;
        debug!(url = %self.config.url, "bridge socket connected");

        let (mut sink, stream) = socket.split();
        let hello = OutboundFrame::Hello { auth }
            .encode()
            .map_err(|e| NexosError::Transport {
                message: "failed to encode bridge hello".into(),
                source: Some(Box::new(e)),
            })?;
        sink.send(Message::text(hello))
            .await
            .map_err(|e| NexosError::Transport {
                message: "failed to send bridge hello".into(),
                source: Some(Box::new(e)),
            })?;

        let cancel = CancellationToken::new();
        let (transport, events) = session::spawn_session(
            stream,
            sink,
            self.config.event_buffer,
            Duration::from_secs(self.config.request_timeout_secs),
            cancel.clone(),
        );
        *self.current.lock().await = Some(cancel);
        info!(url = %self.config.url, "bridge session started");

        Ok(Session { transport, events })
    }
}

#[async_trait]
impl PluginAdapter for BridgeSessionFactory {
    fn name(&self) -> &str {
        "whatsapp-bridge"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, NexosError> {
        match self.current.lock().await.as_ref() {
            Some(token) if !token.is_cancelled() => Ok(HealthStatus::Healthy),
            _ => Ok(HealthStatus::Degraded("no live bridge session".into())),
        }
    }

    async fn shutdown(&self) -> Result<(), NexosError> {
        if let Some(token) = self.current.lock().await.take() {
            token.cancel();
        }
        Ok(())
    }
}
