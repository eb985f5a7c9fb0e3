// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use nexos_core::NexosError;

use crate::context::{CommandContext, CommandHandler};

/// Current wall-clock time in the configured zone.
pub struct TimeCommand {
    timezone: Tz,
}

impl TimeCommand {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn render(&self, now: DateTime<Utc>) -> String {
        let label = match self.timezone {
            Tz::Asia__Aden => "آسيا/عدن",
            other => other.name(),
        };
        let local = now.with_timezone(&self.timezone);
        format!(
            "🕒 الوقت الحالي ({label}): {}",
            local.format("%Y/%m/%d %H:%M:%S")
        )
    }
}

#[async_trait]
impl CommandHandler for TimeCommand {
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError> {
        ctx.reply_text(self.render(Utc::now())).await?;
        Ok(())
    }
}
