// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in chat commands.
//!
//! These are always available; [`all`] returns them in a fixed order so
//! token collisions resolve the same way on every start.

pub mod echo;
pub mod help;
pub mod hi;
pub mod id;
pub mod image;
pub mod ping;
pub mod poll;
pub mod time;

use std::sync::Arc;
use std::time::Duration;

use nexos_config::NexosConfig;
use nexos_core::NexosError;

use crate::module::CommandModule;

pub use echo::EchoCommand;
pub use help::HelpCommand;
pub use hi::HiCommand;
pub use id::IdCommand;
pub use image::ImageCommand;
pub use ping::PingCommand;
pub use poll::PollCommand;
pub use time::TimeCommand;

/// Every built-in command module, configured from `config`.
pub fn all(config: &NexosConfig) -> Result<Vec<CommandModule>, NexosError> {
    let timezone: chrono_tz::Tz = config.bot.timezone.parse().map_err(|_| {
        NexosError::Config(format!("unknown time zone `{}`", config.bot.timezone))
    })?;
    let image = ImageCommand::new(
        config.commands.image_max_bytes,
        Duration::from_secs(config.commands.image_timeout_secs),
    )?;

    Ok(vec![
        CommandModule::declared(
            "help",
            "مساعدة",
            &["قائمة", "تعليمات", "help"],
            Arc::new(HelpCommand),
        ),
        CommandModule::declared(
            "hi",
            "مرحبا",
            &["هلا", "اهلا", "أهلا", "أهلاً", "اهلاً", "السلام"],
            Arc::new(HiCommand),
        ),
        CommandModule::declared(
            "ping",
            "اختبار",
            &["بنق", "تست", "سرعة"],
            Arc::new(PingCommand),
        ),
        CommandModule::declared(
            "time",
            "الوقت",
            &["الساعة", "التاريخ"],
            Arc::new(TimeCommand::new(timezone)),
        ),
        CommandModule::declared("id", "المعرف", &["id"], Arc::new(IdCommand)),
        CommandModule::handler("echo", Arc::new(EchoCommand)),
        CommandModule::declared(
            "image",
            "!صورة",
            &["صورة", "image", "!img", "img"],
            Arc::new(image),
        ),
        CommandModule::declared(
            "polls",
            "!poll",
            &["poll", "!polls", "polls"],
            Arc::new(PollCommand),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandRegistry;

    #[test]
    fn all_builtins_load() {
        let modules = all(&NexosConfig::default()).unwrap();
        assert_eq!(modules.len(), 8);
        let registry = CommandRegistry::load(modules);
        assert_eq!(registry.definitions().len(), 8);
        for token in [
            "مساعدة", "help", "!help", "مرحبا", "السلام", "اختبار", "بنق", "الوقت", "المعرف",
            "id", "echo", "!echo", "!صورة", "صورة", "img", "!img", "!poll", "polls",
        ] {
            assert!(registry.contains(token), "missing {token}");
        }
    }

    #[test]
    fn builtin_tokens_do_not_collide() {
        let registry = CommandRegistry::load(all(&NexosConfig::default()).unwrap());
        let total: usize = registry.definitions().iter().map(|d| d.tokens().len()).sum();
        assert_eq!(registry.len(), total);
    }

    #[test]
    fn invalid_timezone_is_a_config_error() {
        let mut config = NexosConfig::default();
        config.bot.timezone = "Nowhere/City".into();
        assert!(matches!(all(&config), Err(NexosError::Config(_))));
    }
}
