// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use nexos_core::NexosError;

use crate::context::{CommandContext, CommandHandler};

/// Shows the chat and sender identifiers.
pub struct IdCommand;

#[async_trait]
impl CommandHandler for IdCommand {
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError> {
        let group = if ctx.is_group { "نعم" } else { "لا" };
        let text = format!(
            "🆔 المحادثة: {}\n👤 المرسل: {}\n👥 مجموعة: {group}",
            ctx.chat_id, ctx.sender_id
        );
        ctx.reply_text(text).await?;
        Ok(())
    }
}
