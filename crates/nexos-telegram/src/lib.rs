// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram admin relay for the Nexos gateway.
//!
//! Implements [`AdminRelay`] on top of the Telegram Bot API via teloxide.
//! The relay is send-only: it delivers login QR codes and operational
//! notices to a single administrator chat and never polls for updates.

use async_trait::async_trait;
use nexos_config::model::TelegramConfig;
use nexos_core::types::{AdapterType, HealthStatus};
use nexos_core::{AdminRelay, NexosError, PluginAdapter};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile};
use tracing::{debug, error, info, warn};

/// Sent to the admin chat once at boot.
pub const STARTUP_MESSAGE: &str = "🚀 Nexos WhatsApp bot started. QR will arrive here.";

/// Telegram relay bound to the configured admin chat.
pub struct TelegramRelay {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramRelay {
    /// Creates a relay. Requires both `telegram.bot_token` and `telegram.admin_chat_id`.
    pub fn new(config: &TelegramConfig) -> Result<Self, NexosError> {
        let token = config
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                NexosError::Config("telegram.bot_token is required for the Telegram relay".into())
            })?;
        let chat_id = config.admin_chat_id.ok_or_else(|| {
            NexosError::Config("telegram.admin_chat_id is required for the Telegram relay".into())
        })?;

        Ok(Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        })
    }

    /// Builds the relay when Telegram is configured, `None` otherwise.
    pub fn from_config(config: &TelegramConfig) -> Result<Option<Self>, NexosError> {
        if !config.is_configured() {
            warn!("Telegram not configured (missing bot token or admin chat id)");
            return Ok(None);
        }
        Self::new(config).map(Some)
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Sends [`STARTUP_MESSAGE`]. Failures are logged.
    pub async fn announce_startup(&self) {
        match self.send_text(STARTUP_MESSAGE).await {
            Ok(()) => info!("sent startup message to Telegram admin"),
            Err(e) => error!(
                error = %e,
                "failed to send startup message to Telegram; make sure the admin started the bot and the chat id is numeric"
            ),
        }
    }
}

fn relay_error(action: &str, e: teloxide::RequestError) -> NexosError {
    NexosError::Relay {
        message: format!("telegram {action} failed: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl AdminRelay for TelegramRelay {
    async fn send_image(&self, image: Vec<u8>, caption: &str) -> Result<(), NexosError> {
        let size = image.len();
        self.bot
            .send_photo(self.chat_id, InputFile::memory(image).file_name("qr.png"))
            .caption(caption)
            .await
            .map_err(|e| relay_error("sendPhoto", e))?;
        debug!(chat_id = self.chat_id.0, size, "photo relayed");
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), NexosError> {
        self.bot
            .send_message(self.chat_id, text)
            .await
            .map_err(|e| relay_error("sendMessage", e))?;
        debug!(chat_id = self.chat_id.0, "text relayed");
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for TelegramRelay {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Relay
    }

    async fn health_check(&self) -> Result<HealthStatus, NexosError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), NexosError> {
        debug!("Telegram relay shutting down");
        Ok(())
    }
}
