// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use nexos_core::NexosError;

use crate::context::{CommandContext, CommandHandler};

pub const GREETING: &str = "👋 أهلاً وسهلاً! أنا بوت واتساب تابع للمطوّر *بسام حميد*.\nكيف أقدر أساعدك؟ لو حاب تشوف الأوامر اكتب: *مساعدة*.";

pub struct HiCommand;

#[async_trait]
impl CommandHandler for HiCommand {
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError> {
        ctx.reply_text(GREETING).await?;
        Ok(())
    }
}
