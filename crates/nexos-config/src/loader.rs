// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./nexos.toml` > `~/.config/nexos/nexos.toml` > `/etc/nexos/nexos.toml`
//! with environment variable overrides via the `NEXOS_` prefix and the
//! plain deployment names (`TELEGRAM_TOKEN`, `PORT`, ...).

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::debug;

use crate::model::{NexosConfig, SECTION_KEYS};

/// Deployment env names and the keys they set.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("telegram_token", "telegram.bot_token"),
    ("telegram_admin_id", "telegram.admin_chat_id"),
    ("port", "health.port"),
    ("log_level", "bot.log_level"),
    ("admin_wa", "bot.admin_number"),
    ("database_path", "storage.database_path"),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/nexos/nexos.toml` (system-wide)
/// 3. `~/.config/nexos/nexos.toml` (user XDG config)
/// 4. `./nexos.toml` (local directory)
/// 5. `NEXOS_*` environment variables
/// 6. Legacy deployment variables
pub fn load_config() -> Result<NexosConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<NexosConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NexosConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<NexosConfig, figment::Error> {
    debug!(path = %path.display(), "loading config file");
    Figment::new()
        .merge(Serialized::defaults(NexosConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .merge(legacy_env_provider())
        .extract()
}

/// TOML files of the hierarchy, lowest precedence first.
pub fn config_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("/etc/nexos/nexos.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        files.push(config_dir.join("nexos/nexos.toml"));
    }
    files.push(PathBuf::from("nexos.toml"));
    files
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(NexosConfig::default()));
    for path in config_files() {
        if path.is_file() {
            debug!(path = %path.display(), "merging config file");
        }
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider()).merge(legacy_env_provider())
}

/// Maps `NEXOS_TELEGRAM_BOT_TOKEN` to `telegram.bot_token`.
///
/// Uses explicit section prefixes instead of `Env::split("_")`, since key
/// names contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("NEXOS_").map(|key| section_key(key.as_str()).into())
}

fn legacy_env_provider() -> Env {
    let names: Vec<&str> = LEGACY_ENV.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        let lowered = key.as_str().to_ascii_lowercase();
        LEGACY_ENV
            .iter()
            .find(|(name, _)| *name == lowered)
            .map(|(_, target)| target.to_string())
            .unwrap_or(lowered)
            .into()
    })
}

/// Turns `reconnect_max_delay_secs` into `reconnect.max_delay_secs`.
pub(crate) fn section_key(key: &str) -> String {
    let lowered = key.to_ascii_lowercase();
    for (section, _) in SECTION_KEYS {
        if let Some(rest) = lowered
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    lowered
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[traced_test]
    #[test]
    fn merged_files_are_logged() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("nexos.toml", "[bot]\nname = \"jailed\"\n")?;
            let config = load_config()?;
            assert_eq!(config.bot.name, "jailed");
            assert!(logs_contain("merging config file"));
            Ok(())
        });
    }

    #[test]
    fn section_key_splits_on_first_section_only() {
        assert_eq!(section_key("telegram_bot_token"), "telegram.bot_token");
        assert_eq!(section_key("BOT_ADMIN_NUMBER"), "bot.admin_number");
        assert_eq!(
            section_key("reconnect_flap_window_secs"),
            "reconnect.flap_window_secs"
        );
    }

    #[test]
    fn section_key_leaves_unknown_keys() {
        assert_eq!(section_key("mystery"), "mystery");
        assert_eq!(section_key("bots"), "bots");
    }
}
