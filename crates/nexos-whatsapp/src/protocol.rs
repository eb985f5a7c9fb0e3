// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON frames exchanged with the WhatsApp bridge sidecar.
//!
//! Every frame is a JSON object with a `type` tag. The bridge pushes events
//! and `result` frames; the gateway sends a `hello` carrying the stored auth
//! state, followed by `send` and `group_metadata` requests correlated by `id`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use nexos_core::types::{
    AuthState, ConnectionStatus, ConnectionUpdate, DisconnectInfo, GroupParticipantsUpdate,
    InboundMessage, KeyUpdate,
};
use nexos_core::{OutboundContent, TransportEvent};
use serde::{Deserialize, Serialize};

/// Frames received from the bridge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundFrame {
    #[serde(rename = "connection.update", rename_all = "camelCase")]
    Connection {
        #[serde(default)]
        connection: Option<ConnectionStatus>,
        #[serde(default)]
        qr: Option<String>,
        #[serde(default)]
        last_disconnect: Option<DisconnectInfo>,
        /// Own account JID, reported once the session is open.
        #[serde(default)]
        me: Option<String>,
    },
    #[serde(rename = "messages.upsert")]
    Messages {
        #[serde(default)]
        messages: Vec<InboundMessage>,
    },
    #[serde(rename = "creds.update")]
    Creds { creds: serde_json::Value },
    #[serde(rename = "keys.update")]
    Keys {
        #[serde(default)]
        updates: Vec<KeyUpdate>,
    },
    #[serde(rename = "group-participants.update")]
    GroupParticipants(GroupParticipantsUpdate),
    /// Reply to a request previously sent by the gateway.
    #[serde(rename = "result")]
    Result {
        id: String,
        #[serde(default)]
        ok: bool,
        #[serde(default)]
        data: Option<serde_json::Value>,
        #[serde(default)]
        error: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// What a decoded inbound frame means to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event {
        event: TransportEvent,
        self_id: Option<String>,
    },
    Reply {
        id: String,
        outcome: Result<serde_json::Value, String>,
    },
    Ignored,
}

impl InboundFrame {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn into_inbound(self) -> Inbound {
        let event = match self {
            InboundFrame::Connection {
                connection,
                qr,
                last_disconnect,
                me,
            } => {
                return Inbound::Event {
                    event: TransportEvent::Connection(ConnectionUpdate {
                        connection,
                        qr,
                        last_disconnect,
                    }),
                    self_id: me,
                };
            }
            InboundFrame::Messages { messages } => TransportEvent::Messages(messages),
            InboundFrame::Creds { creds } => TransportEvent::CredsUpdate(creds),
            InboundFrame::Keys { updates } => TransportEvent::KeysUpdate(updates),
            InboundFrame::GroupParticipants(update) => TransportEvent::GroupParticipants(update),
            InboundFrame::Result {
                id,
                ok,
                data,
                error,
            } => {
                let outcome = if ok {
                    Ok(data.unwrap_or(serde_json::Value::Null))
                } else {
                    Err(error.unwrap_or_else(|| "bridge rejected the request".to_string()))
                };
                return Inbound::Reply { id, outcome };
            }
            InboundFrame::Unknown => return Inbound::Ignored,
        };
        Inbound::Event {
            event,
            self_id: None,
        }
    }
}

/// Message content in the shape the bridge expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentFrame {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        mentions: Vec<String>,
    },
    Image {
        /// Base64-encoded image bytes.
        data: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Poll {
        name: String,
        values: Vec<String>,
        selectable_count: u32,
    },
}

impl From<OutboundContent> for ContentFrame {
    fn from(content: OutboundContent) -> Self {
        match content {
            OutboundContent::Text { text, mentions } => ContentFrame::Text { text, mentions },
            OutboundContent::Image { bytes, caption } => ContentFrame::Image {
                data: STANDARD.encode(bytes),
                caption,
            },
            OutboundContent::Poll {
                name,
                options,
                selectable_count,
            } => ContentFrame::Poll {
                name,
                values: options,
                selectable_count,
            },
        }
    }
}

/// Frames sent to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    #[serde(rename = "hello")]
    Hello { auth: AuthState },
    #[serde(rename = "send", rename_all = "camelCase")]
    Send {
        id: String,
        chat_id: String,
        content: ContentFrame,
        #[serde(skip_serializing_if = "Option::is_none")]
        quoted: Option<InboundMessage>,
    },
    #[serde(rename = "group_metadata", rename_all = "camelCase")]
    GroupMetadata { id: String, group_id: String },
}

impl OutboundFrame {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
