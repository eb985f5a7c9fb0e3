// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `!poll question | a, b, c`: creates a single-choice poll.

use async_trait::async_trait;
use nexos_core::{NexosError, OutboundContent};

use crate::context::{CommandContext, CommandHandler};

pub const USAGE: &str = "استخدم: `!poll سؤال | خيار1, خيار2, خيار3`";
pub const TOO_FEW_OPTIONS: &str = "رجاءً اكتب خيارين على الأقل.";

#[derive(Debug, PartialEq, Eq)]
pub enum PollInput {
    Poll { question: String, options: Vec<String> },
    Usage,
    TooFewOptions,
}

/// Parses `question | a, b, c`. Anything after a second `|` is ignored.
pub fn parse(raw: &str) -> PollInput {
    let mut parts = raw.split('|').map(str::trim);
    let question = parts.next().unwrap_or_default();
    let options = parts.next().unwrap_or_default();
    if question.is_empty() || options.is_empty() {
        return PollInput::Usage;
    }

    let options: Vec<String> = options
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if options.len() < 2 {
        return PollInput::TooFewOptions;
    }
    PollInput::Poll {
        question: question.to_string(),
        options,
    }
}

pub struct PollCommand;

#[async_trait]
impl CommandHandler for PollCommand {
    async fn run(&self, ctx: CommandContext) -> Result<(), NexosError> {
        match parse(&ctx.raw_args()) {
            PollInput::Usage => {
                ctx.reply_text(USAGE).await?;
            }
            PollInput::TooFewOptions => {
                ctx.reply_text(TOO_FEW_OPTIONS).await?;
            }
            PollInput::Poll { question, options } => {
                ctx.reply(OutboundContent::Poll {
                    name: question,
                    options,
                    selectable_count: 1,
                })
                .await?;
            }
        }
        Ok(())
    }
}
