// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the transport, router, supervisor, and storage layers.
//!
//! Wire-facing structs mirror the field names the WhatsApp bridge emits
//! (camelCase), so they deserialize directly from bridge frames.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::jid;

/// HTTP-style status code the transport reports when the session was logged out.
pub const LOGGED_OUT_STATUS: u16 = 401;

/// Unique identifier for a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Storage,
    Relay,
    Observability,
}

// --- Inbound messages ---

/// Addressing information of an inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    /// Chat the message belongs to (user JID or group JID).
    pub remote_jid: String,
    /// Set when the message was sent by the bot's own account.
    #[serde(default)]
    pub from_me: bool,
    /// Author inside a group chat. Absent in private chats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    /// Transport-assigned message id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedText {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCaption {
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonReply {
    #[serde(default)]
    pub selected_display_text: Option<String>,
}

/// The content variants of an inbound message that can carry text.
///
/// Unknown content kinds are ignored during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_text_message: Option<ExtendedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_message: Option<MediaCaption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_message: Option<MediaCaption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_message: Option<MediaCaption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons_response_message: Option<ButtonReply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_button_reply_message: Option<ButtonReply>,
}

impl MessagePayload {
    /// Returns the first non-empty text field in priority order.
    ///
    /// Plain text wins over extended text, which wins over media captions,
    /// which win over button selections. The result is not trimmed.
    pub fn text(&self) -> Option<&str> {
        let candidates = [
            self.conversation.as_deref(),
            self.extended_text_message
                .as_ref()
                .and_then(|m| m.text.as_deref()),
            self.image_message.as_ref().and_then(|m| m.caption.as_deref()),
            self.video_message.as_ref().and_then(|m| m.caption.as_deref()),
            self.document_message
                .as_ref()
                .and_then(|m| m.caption.as_deref()),
            self.buttons_response_message
                .as_ref()
                .and_then(|m| m.selected_display_text.as_deref()),
            self.template_button_reply_message
                .as_ref()
                .and_then(|m| m.selected_display_text.as_deref()),
        ];
        candidates.into_iter().flatten().find(|s| !s.is_empty())
    }
}

/// A single inbound message as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub key: MessageKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessagePayload>,
    /// Send time in seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
}

impl InboundMessage {
    /// Chat identifier the message belongs to.
    pub fn chat_id(&self) -> &str {
        &self.key.remote_jid
    }

    pub fn is_group(&self) -> bool {
        jid::is_group(&self.key.remote_jid)
    }

    /// Sender identifier with any device suffix (`:N`) removed.
    pub fn sender_id(&self) -> String {
        jid::normalize_sender(self.key.participant.as_deref(), &self.key.remote_jid)
    }

    /// Raw extracted text, before trimming.
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().and_then(MessagePayload::text)
    }
}

// --- Outbound messages ---

/// Content of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundContent {
    Text {
        text: String,
        /// JIDs mentioned in the text.
        mentions: Vec<String>,
    },
    Image {
        bytes: Vec<u8>,
        caption: Option<String>,
    },
    Poll {
        name: String,
        options: Vec<String>,
        selectable_count: u32,
    },
}

impl OutboundContent {
    /// Plain text without mentions.
    pub fn text(text: impl Into<String>) -> Self {
        OutboundContent::Text {
            text: text.into(),
            mentions: Vec::new(),
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundContent::Text { .. } => "text",
            OutboundContent::Image { .. } => "image",
            OutboundContent::Poll { .. } => "poll",
        }
    }
}

/// Per-send options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Inbound message to quote in the reply.
    pub quoted: Option<InboundMessage>,
}

impl SendOptions {
    pub fn quoting(msg: &InboundMessage) -> Self {
        Self {
            quoted: Some(msg.clone()),
        }
    }
}

// --- Connection lifecycle ---

/// Connection status carried by a connection update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Close,
}

/// Details of the most recent disconnect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectInfo {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A connection-state event from the transport.
///
/// A single update may carry a login challenge, a status change, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionUpdate {
    #[serde(default)]
    pub connection: Option<ConnectionStatus>,
    /// Login challenge payload to be rendered as a QR code.
    #[serde(default)]
    pub qr: Option<String>,
    #[serde(default)]
    pub last_disconnect: Option<DisconnectInfo>,
}

impl ConnectionUpdate {
    /// An update announcing a close with the given status code.
    pub fn closed(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            connection: Some(ConnectionStatus::Close),
            qr: None,
            last_disconnect: Some(DisconnectInfo {
                status_code,
                message: Some(message.into()),
            }),
        }
    }
}

/// Classified reason for a connection close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DisconnectCause {
    /// The account session was revoked; only a fresh login can recover.
    LoggedOut,
    /// Anything else: network loss, server restart, stream errors.
    Transient,
}

impl DisconnectCause {
    pub fn classify(info: Option<&DisconnectInfo>) -> Self {
        match info.and_then(|i| i.status_code) {
            Some(LOGGED_OUT_STATUS) => DisconnectCause::LoggedOut,
            _ => DisconnectCause::Transient,
        }
    }
}

/// Lifecycle phase of the supervised connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    Connecting,
    Open,
    Closed,
    /// Terminal: no automatic reconnection until an operator logs in again.
    LoggedOut,
}

/// Read-only view of the supervised connection, published to the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub phase: ConnectionPhase,
    /// Consecutive non-flap transient closes since the last open.
    pub attempt_count: u32,
    /// Delay of the most recently scheduled reconnect.
    pub reconnect_delay: Option<std::time::Duration>,
}

impl Default for ConnectionSnapshot {
    fn default() -> Self {
        Self {
            phase: ConnectionPhase::Connecting,
            attempt_count: 0,
            reconnect_delay: None,
        }
    }
}

// --- Groups ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
    #[serde(other)]
    Other,
}

/// Membership change in a group chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupParticipantsUpdate {
    /// Group JID.
    pub id: String,
    #[serde(default)]
    pub participants: Vec<String>,
    pub action: ParticipantAction,
}

/// Group subject and description as reported by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, rename = "desc")]
    pub description: Option<String>,
}

// --- Credentials ---

/// One signal-key mutation. `value = None` deletes the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyUpdate {
    #[serde(rename = "type")]
    pub key_type: String,
    pub id: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// A persisted signal key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub id: String,
    pub value: serde_json::Value,
}

/// Everything the transport needs to resume a session without a new login.
///
/// Both parts are opaque to the gateway and only round-tripped through storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    #[serde(default)]
    pub creds: Option<serde_json::Value>,
    #[serde(default)]
    pub keys: Vec<StoredKey>,
}

impl AuthState {
    /// Whether a previous login exists.
    pub fn has_creds(&self) -> bool {
        self.creds.is_some()
    }
}

// --- Ignore list ---

/// A muted chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreEntry {
    pub chat_id: String,
    pub added_by: String,
    /// ISO 8601 timestamp of when the chat was muted.
    pub created_at: String,
}

// --- Transport events ---

/// Everything a transport session can emit, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connection(ConnectionUpdate),
    /// A batch of inbound messages (`messages.upsert`).
    Messages(Vec<InboundMessage>),
    /// Session credentials rotated.
    CredsUpdate(serde_json::Value),
    /// Signal keys were added, replaced, or removed.
    KeysUpdate(Vec<KeyUpdate>),
    GroupParticipants(GroupParticipantsUpdate),
}

impl TransportEvent {
    /// Event name for logs, matching the bridge's frame tags.
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::Connection(_) => "connection.update",
            TransportEvent::Messages(_) => "messages.upsert",
            TransportEvent::CredsUpdate(_) => "creds.update",
            TransportEvent::KeysUpdate(_) => "keys.update",
            TransportEvent::GroupParticipants(_) => "group-participants.update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_prefers_conversation_over_captions() {
        let payload = MessagePayload {
            conversation: Some("hello".into()),
            image_message: Some(MediaCaption {
                caption: Some("caption".into()),
            }),
            ..Default::default()
        };
        assert_eq!(payload.text(), Some("hello"));
    }

    #[test]
    fn text_skips_empty_fields() {
        let payload = MessagePayload {
            conversation: Some(String::new()),
            extended_text_message: Some(ExtendedText { text: None }),
            video_message: Some(MediaCaption {
                caption: Some("clip".into()),
            }),
            ..Default::default()
        };
        assert_eq!(payload.text(), Some("clip"));
    }

    #[test]
    fn text_falls_back_to_button_replies() {
        let payload = MessagePayload {
            template_button_reply_message: Some(ButtonReply {
                selected_display_text: Some("Option A".into()),
            }),
            ..Default::default()
        };
        assert_eq!(payload.text(), Some("Option A"));
        assert_eq!(MessagePayload::default().text(), None);
    }

    #[test]
    fn inbound_message_deserializes_bridge_shape() {
        let json = r#"{
            "key": {"remoteJid": "123@g.us", "fromMe": false, "participant": "967700:12@s.whatsapp.net", "id": "ABC"},
            "message": {"extendedTextMessage": {"text": "!ping"}},
            "messageTimestamp": 1700000000,
            "pushName": "Ali"
        }"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.chat_id(), "123@g.us");
        assert!(msg.is_group());
        assert_eq!(msg.sender_id(), "967700");
        assert_eq!(msg.text(), Some("!ping"));
        assert_eq!(msg.message_timestamp, Some(1_700_000_000));
    }

    #[test]
    fn unknown_message_kinds_are_ignored() {
        let json = r#"{"key": {"remoteJid": "1@s.whatsapp.net"}, "message": {"stickerMessage": {}}}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.text(), None);
        assert!(!msg.key.from_me);
    }

    #[test]
    fn disconnect_classification() {
        let logged_out = DisconnectInfo {
            status_code: Some(401),
            message: None,
        };
        let restart = DisconnectInfo {
            status_code: Some(515),
            message: None,
        };
        assert_eq!(
            DisconnectCause::classify(Some(&logged_out)),
            DisconnectCause::LoggedOut
        );
        assert_eq!(
            DisconnectCause::classify(Some(&restart)),
            DisconnectCause::Transient
        );
        assert_eq!(DisconnectCause::classify(None), DisconnectCause::Transient);
    }

    #[test]
    fn connection_phase_display_round_trip() {
        use std::str::FromStr;
        for phase in [
            ConnectionPhase::Connecting,
            ConnectionPhase::Open,
            ConnectionPhase::Closed,
            ConnectionPhase::LoggedOut,
        ] {
            let s = phase.to_string();
            assert_eq!(ConnectionPhase::from_str(&s).unwrap(), phase);
        }
        assert_eq!(ConnectionPhase::LoggedOut.to_string(), "logged_out");
    }

    #[test]
    fn participant_action_tolerates_unknown_values() {
        let json = r#"{"id": "1@g.us", "participants": ["2@s.whatsapp.net"], "action": "modify"}"#;
        let update: GroupParticipantsUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.action, ParticipantAction::Other);
    }
}
