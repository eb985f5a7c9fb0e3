// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use nexos_core::NexosError;

use crate::context::{CommandContext, CommandHandler};

/// Repeats its arguments. Registered as a bare handler (`!echo` / `echo`).
pub struct EchoCommand;

#[async_trait]
impl CommandHandler for EchoCommand {
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError> {
        let text = ctx.raw_args();
        if text.is_empty() {
            ctx.reply_text("استخدم: `!echo نص`").await?;
        } else {
            ctx.reply_text(text).await?;
        }
        Ok(())
    }
}
