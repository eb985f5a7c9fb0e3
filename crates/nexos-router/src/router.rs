// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message dispatch pipeline.
//!
//! Order of precedence: filter > admin override > mute list > command >
//! keyword > onboarding hint.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use nexos_commands::{CommandContext, CommandHandler, CommandRegistry};
use nexos_config::NexosConfig;
use nexos_core::jid::STATUS_BROADCAST;
use nexos_core::{IgnoreStore, InboundMessage, NexosError, OutboundContent, SendOptions, Transport};
use tracing::{Instrument, debug, error, info, info_span};

use crate::admin::{self, AdminCommand};
use crate::throttle::HintThrottle;

/// Router knobs derived from configuration.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Admin phone number, digits only.
    pub admin_digits: Option<String>,
    /// Keyword replies, keyed by lower-cased trigger.
    pub keywords: HashMap<String, String>,
    pub default_hint: String,
    pub hint_interval: Duration,
    pub hint_capacity: NonZeroUsize,
}

impl RouterSettings {
    pub fn from_config(config: &NexosConfig) -> Self {
        Self {
            admin_digits: config.bot.admin_digits(),
            keywords: config
                .keywords
                .iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v.clone()))
                .collect(),
            default_hint: config.bot.default_hint.clone(),
            hint_interval: Duration::from_secs(config.bot.hint_interval_secs),
            hint_capacity: NonZeroUsize::new(config.bot.hint_capacity).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// How a message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Status broadcast or the bot's own message.
    Filtered,
    NoText,
    Admin,
    /// The chat is muted.
    Ignored,
    Command { name: String },
    Keyword,
    Hint,
    HintThrottled,
    /// Group chat text that matched nothing.
    Unhandled,
    Failed,
}

impl RouteOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            RouteOutcome::Filtered => "filtered",
            RouteOutcome::NoText => "no_text",
            RouteOutcome::Admin => "admin",
            RouteOutcome::Ignored => "ignored",
            RouteOutcome::Command { .. } => "command",
            RouteOutcome::Keyword => "keyword",
            RouteOutcome::Hint => "hint",
            RouteOutcome::HintThrottled => "hint_throttled",
            RouteOutcome::Unhandled => "unhandled",
            RouteOutcome::Failed => "failed",
        }
    }
}

/// Dispatches inbound messages to admin actions, commands, keywords and the hint.
pub struct MessageRouter {
    registry: Arc<CommandRegistry>,
    ignore: Arc<dyn IgnoreStore>,
    settings: RouterSettings,
    throttle: HintThrottle,
}

impl MessageRouter {
    pub fn new(
        registry: Arc<CommandRegistry>,
        ignore: Arc<dyn IgnoreStore>,
        settings: RouterSettings,
    ) -> Self {
        let throttle = HintThrottle::new(settings.hint_interval, settings.hint_capacity);
        Self {
            registry,
            ignore,
            settings,
            throttle,
        }
    }

    /// Handles the first message of a batch. An empty batch is filtered.
    pub async fn handle_batch(
        &self,
        transport: &Arc<dyn Transport>,
        batch: &[InboundMessage],
    ) -> RouteOutcome {
        match batch.first() {
            Some(message) => self.handle(transport, message).await,
            None => RouteOutcome::Filtered,
        }
    }

    /// Routes one message. Never fails; errors are logged and reported as
    /// [`RouteOutcome::Failed`].
    pub async fn handle(
        &self,
        transport: &Arc<dyn Transport>,
        message: &InboundMessage,
    ) -> RouteOutcome {
        let outcome = match self.route(transport, message).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    chat_id = %message.chat_id(),
                    error = %error_chain(&e),
                    "message handling failed"
                );
                RouteOutcome::Failed
            }
        };
        debug!(chat_id = %message.chat_id(), outcome = outcome.label(), "message routed");
        nexos_prometheus::record_message(outcome.label());
        outcome
    }

    async fn route(
        &self,
        transport: &Arc<dyn Transport>,
        message: &InboundMessage,
    ) -> Result<RouteOutcome, NexosError> {
        let chat_id = message.chat_id();
        if chat_id == STATUS_BROADCAST || message.key.from_me {
            return Ok(RouteOutcome::Filtered);
        }

        let text = message.text().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Ok(RouteOutcome::NoText);
        }
        let lowered = text.to_lowercase();
        let sender_id = message.sender_id();

        if let Some(admin_digits) = self.settings.admin_digits.as_deref()
            && admin::is_admin(admin_digits, &sender_id, chat_id)
            && let Some(command) = AdminCommand::parse(&lowered)
        {
            let reply = command.execute(self.ignore.as_ref()).await?;
            info!(chat_id = %chat_id, action = command.label(), "admin command");
            transport
                .send_message(
                    chat_id,
                    OutboundContent::text(reply),
                    SendOptions::quoting(message),
                )
                .await?;
            return Ok(RouteOutcome::Admin);
        }

        if self.ignore.exists(chat_id).await? {
            return Ok(RouteOutcome::Ignored);
        }

        let mut words = text.split_whitespace();
        let token = words.next().unwrap_or_default().to_lowercase();
        if let Some(definition) = self.registry.resolve(&token) {
            let ctx = CommandContext {
                transport: Arc::clone(transport),
                message: message.clone(),
                args: words.map(str::to_string).collect(),
                chat_id: chat_id.to_string(),
                sender_id,
                is_group: message.is_group(),
            };
            let span = info_span!("command", command = %definition.name, chat_id = %chat_id);
            let started = tokio::time::Instant::now();
            let result = definition.handler.run(ctx).instrument(span).await;
            nexos_prometheus::record_command(&definition.name, started.elapsed().as_secs_f64());
            result?;
            return Ok(RouteOutcome::Command {
                name: definition.name.clone(),
            });
        }

        // A multi-word command token never resolves through the first word,
        // but it still shadows a keyword with the same text.
        if let Some(reply) = self.settings.keywords.get(&lowered)
            && !self.registry.contains(&lowered)
        {
            transport
                .send_message(
                    chat_id,
                    OutboundContent::text(reply.clone()),
                    SendOptions::quoting(message),
                )
                .await?;
            return Ok(RouteOutcome::Keyword);
        }

        if message.is_group() {
            return Ok(RouteOutcome::Unhandled);
        }
        if !self
            .throttle
            .try_acquire(chat_id, tokio::time::Instant::now())
            .await
        {
            return Ok(RouteOutcome::HintThrottled);
        }
        transport
            .send_message(
                chat_id,
                OutboundContent::text(self.settings.default_hint.clone()),
                SendOptions::quoting(message),
            )
            .await?;
        Ok(RouteOutcome::Hint)
    }
}

/// `outer: inner: root`, following `source()` links.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
