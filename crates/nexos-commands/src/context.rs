// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler contract and the per-invocation context.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use nexos_core::{InboundMessage, MessageId, NexosError, OutboundContent, SendOptions, Transport};

/// Everything a handler knows about one invocation.
#[derive(Clone)]
pub struct CommandContext {
    /// Send-only handle to the current session.
    pub transport: Arc<dyn Transport>,
    pub message: InboundMessage,
    /// Whitespace-separated words after the command token.
    pub args: Vec<String>,
    pub chat_id: String,
    /// Participant id (or chat id in private chats) without device suffix.
    pub sender_id: String,
    pub is_group: bool,
}

impl CommandContext {
    /// Sends `content` to the invoking chat, quoting the command message.
    pub async fn reply(&self, content: OutboundContent) -> Result<MessageId, NexosError> {
        self.transport
            .send_message(&self.chat_id, content, SendOptions::quoting(&self.message))
            .await
    }

    pub async fn reply_text(&self, text: impl Into<String>) -> Result<MessageId, NexosError> {
        self.reply(OutboundContent::text(text)).await
    }

    /// Arguments joined back with single spaces.
    pub fn raw_args(&self) -> String {
        self.args.join(" ")
    }
}

/// A command body.
///
/// User-facing failures (bad input, unreachable URLs) are answered by the
/// handler itself. A returned error is logged by the router and dropped.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(CommandContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), NexosError>> + Send + 'static,
{
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError> {
        (self.0)(ctx).await
    }
}

/// Wraps an async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), NexosError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
