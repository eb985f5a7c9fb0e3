// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One live bridge connection: the send handle plus its reader and writer tasks.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::{Sink, SinkExt, Stream, StreamExt};
use nexos_core::types::{ConnectionUpdate, GroupMetadata, MessageId};
use nexos_core::{NexosError, OutboundContent, SendOptions, Transport, TransportEvent};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{Inbound, InboundFrame, OutboundFrame};

type Reply = Result<serde_json::Value, String>;
type PendingMap = Arc<DashMap<String, oneshot::Sender<Reply>>>;

/// Send handle of a bridge session.
pub struct BridgeTransport {
    outbound: mpsc::Sender<String>,
    pending: PendingMap,
    self_id: Arc<RwLock<Option<String>>>,
    request_timeout: Duration,
}

impl BridgeTransport {
    async fn request(&self, frame: OutboundFrame, id: String) -> Result<serde_json::Value, NexosError> {
        let text = frame.encode().map_err(|e| NexosError::Transport {
            message: "failed to encode bridge frame".into(),
            source: Some(Box::new(e)),
        })?;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);

        if self.outbound.send(text).await.is_err() {
            self.pending.remove(&id);
            return Err(NexosError::transport("bridge connection closed"));
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(Ok(data))) => Ok(data),
            Ok(Ok(Err(message))) => Err(NexosError::transport(format!("bridge error: {message}"))),
            Ok(Err(_)) => Err(NexosError::transport(
                "bridge connection closed before replying",
            )),
            Err(_) => {
                self.pending.remove(&id);
                Err(NexosError::Timeout {
                    duration: self.request_timeout,
                })
            }
        }
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    fn self_id(&self) -> Option<String> {
        self.self_id.read().ok().and_then(|id| id.clone())
    }

    async fn send_message(
        &self,
        chat_id: &str,
        content: OutboundContent,
        options: SendOptions,
    ) -> Result<MessageId, NexosError> {
        let id = Uuid::new_v4().to_string();
        let kind = content.kind();
        let frame = OutboundFrame::Send {
            id: id.clone(),
            chat_id: chat_id.to_string(),
            content: content.into(),
            quoted: options.quoted,
        };
        let data = self.request(frame, id.clone()).await?;
        debug!(chat_id, kind, "message sent via bridge");

        let message_id = data
            .get("messageId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or(id);
        Ok(MessageId(message_id))
    }

    async fn group_metadata(&self, group_id: &str) -> Result<GroupMetadata, NexosError> {
        let id = Uuid::new_v4().to_string();
        let frame = OutboundFrame::GroupMetadata {
            id: id.clone(),
            group_id: group_id.to_string(),
        };
        let data = self.request(frame, id).await?;
        serde_json::from_value(data).map_err(|e| NexosError::Transport {
            message: format!("malformed group metadata for {group_id}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Wires a connected socket into a transport handle and an event receiver.
///
/// The reader task ends on socket close, a socket error, or when the event
/// receiver is dropped. On socket close it emits a synthetic close update
/// without a status code before ending the stream. Ending the reader cancels
/// `cancel`, which stops the writer and fails any in-flight requests.
pub(crate) fn spawn_session<S, K>(
    stream: S,
    sink: K,
    event_buffer: usize,
    request_timeout: Duration,
    cancel: CancellationToken,
) -> (Arc<BridgeTransport>, mpsc::Receiver<TransportEvent>)
where
    S: Stream<Item = Result<Message, WsError>> + Unpin + Send + 'static,
    K: Sink<Message, Error = WsError> + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::channel::<String>(event_buffer.max(1));
    let (event_tx, event_rx) = mpsc::channel(event_buffer.max(1));
    let pending: PendingMap = Arc::new(DashMap::new());
    let self_id = Arc::new(RwLock::new(None));

    tokio::spawn(write_loop(sink, out_rx, cancel.clone()));
    tokio::spawn(read_loop(
        stream,
        event_tx,
        Arc::clone(&pending),
        Arc::clone(&self_id),
        cancel,
    ));

    let transport = Arc::new(BridgeTransport {
        outbound: out_tx,
        pending,
        self_id,
        request_timeout,
    });
    (transport, event_rx)
}

async fn write_loop<K>(mut sink: K, mut outbound: mpsc::Receiver<String>, cancel: CancellationToken)
where
    K: Sink<Message, Error = WsError> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            next = outbound.recv() => {
                let Some(text) = next else { break };
                if let Err(e) = sink.send(Message::text(text)).await {
                    warn!(error = %e, "bridge write failed");
                    cancel.cancel();
                    break;
                }
            }
        }
    }
    let _ = sink.send(Message::Close(None)).await;
    let _ = sink.close().await;
    debug!("bridge writer stopped");
}

async fn read_loop<S>(
    mut stream: S,
    events: mpsc::Sender<TransportEvent>,
    pending: PendingMap,
    self_id: Arc<RwLock<Option<String>>>,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let reason = loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break None,
            next = stream.next() => next,
        };
        let text = match next {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(frame))) => {
                break Some(
                    frame
                        .map(|f| format!("bridge closed the socket: {}", f.reason.as_str()))
                        .unwrap_or_else(|| "bridge closed the socket".to_string()),
                );
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => break Some(format!("bridge socket error: {e}")),
            None => break Some("bridge socket ended".to_string()),
        };

        let frame = match InboundFrame::decode(text.as_str()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping malformed bridge frame");
                continue;
            }
        };

        match frame.into_inbound() {
            Inbound::Reply { id, outcome } => match pending.remove(&id) {
                Some((_, tx)) => {
                    let _ = tx.send(outcome);
                }
                None => debug!(id, "reply for unknown or expired request"),
            },
            Inbound::Event { event, self_id: me } => {
                if let Some(me) = me
                    && let Ok(mut slot) = self_id.write()
                {
                    *slot = Some(me);
                }
                if events.send(event).await.is_err() {
                    debug!("session receiver dropped, closing bridge connection");
                    break None;
                }
            }
            Inbound::Ignored => {}
        }
    };

    if let Some(reason) = reason {
        info!(%reason, "bridge connection lost");
        let _ = events
            .send(TransportEvent::Connection(ConnectionUpdate::closed(None, reason)))
            .await;
    }
    cancel.cancel();
    pending.clear();
}
