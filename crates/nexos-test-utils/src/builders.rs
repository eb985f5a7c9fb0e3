// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message constructors.

use nexos_core::types::{InboundMessage, MessageKey, MessagePayload};

/// A plain-text message in a private chat.
pub fn private_text(chat_id: &str, text: &str) -> InboundMessage {
    MessageBuilder::new(chat_id).text(text).build()
}

/// A plain-text message in a group, authored by `participant`.
pub fn group_text(group_id: &str, participant: &str, text: &str) -> InboundMessage {
    MessageBuilder::new(group_id)
        .participant(participant)
        .text(text)
        .build()
}

#[derive(Debug, Clone)]
pub struct MessageBuilder {
    message: InboundMessage,
}

impl MessageBuilder {
    pub fn new(chat_id: &str) -> Self {
        Self {
            message: InboundMessage {
                key: MessageKey {
                    remote_jid: chat_id.to_string(),
                    from_me: false,
                    participant: None,
                    id: Some("TEST-MSG".to_string()),
                },
                message: None,
                message_timestamp: None,
                push_name: None,
            },
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.payload().conversation = Some(text.to_string());
        self
    }

    pub fn payload_with(mut self, payload: MessagePayload) -> Self {
        self.message.message = Some(payload);
        self
    }

    pub fn participant(mut self, participant: &str) -> Self {
        self.message.key.participant = Some(participant.to_string());
        self
    }

    pub fn from_me(mut self) -> Self {
        self.message.key.from_me = true;
        self
    }

    pub fn timestamp(mut self, secs: i64) -> Self {
        self.message.message_timestamp = Some(secs);
        self
    }

    pub fn build(self) -> InboundMessage {
        self.message
    }

    fn payload(&mut self) -> &mut MessagePayload {
        self.message.message.get_or_insert_with(MessagePayload::default)
    }
}
