// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use nexos_core::NexosError;

use crate::context::{CommandContext, CommandHandler};

pub const HELP_TEXT: &str = "🤖 *قائمة الأوامر*

👋 مرحبا — ترحيب وتعريف سريع
🏓 اختبار — قياس استجابة البوت
🕒 الوقت — عرض الوقت الحالي (آسيا/عدن)
🆔 المعرف — عرض معرفات المحادثة والمرسل
🖼️ !صورة <رابط> — إرسال صورة من رابط
📊 !poll سؤال | خيار1, خيار2 — إنشاء تصويت
📄 مساعدة — هذه القائمة

ملاحظة: أنا بوت واتساب تابع للمطوّر *بسام حميد*. لو عندك استفسار برسّله له.";

/// Static command menu.
pub struct HelpCommand;

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError> {
        ctx.reply_text(HELP_TEXT).await?;
        Ok(())
    }
}
