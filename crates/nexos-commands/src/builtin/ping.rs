// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use chrono::Utc;
use nexos_core::NexosError;

use crate::context::{CommandContext, CommandHandler};

/// Reports how long the message took to reach the bot.
pub struct PingCommand;

/// Milliseconds between the message's send time and `now_ms`, never negative.
///
/// A message without a timestamp counts as sent at `now_ms`.
pub fn latency_ms(message_timestamp: Option<i64>, now_ms: i64) -> i64 {
    let sent_ms = message_timestamp
        .map(|secs| secs.saturating_mul(1000))
        .unwrap_or(now_ms);
    now_ms.saturating_sub(sent_ms).max(0)
}

#[async_trait]
impl CommandHandler for PingCommand {
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError> {
        let latency = latency_ms(ctx.message.message_timestamp, Utc::now().timestamp_millis());
        ctx.reply_text(format!("🏓 اختبار الاستجابة: ~{latency} ملّي ثانية"))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_from_timestamp() {
        assert_eq!(latency_ms(Some(100), 100_250), 250);
    }

    #[test]
    fn future_timestamps_clamp_to_zero() {
        assert_eq!(latency_ms(Some(200), 100_000), 0);
    }

    #[test]
    fn missing_timestamp_is_zero() {
        assert_eq!(latency_ms(None, 123_456), 0);
    }
}
