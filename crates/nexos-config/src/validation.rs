// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as the shape of the backoff table, the bridge URL scheme and the time zone.

use crate::diagnostic::ConfigError;
use crate::model::NexosConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &NexosConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |section: &'static str, key: &'static str, message: String| {
        errors.push(ConfigError::validation(section, key, message));
    };

    let reconnect = &config.reconnect;
    if reconnect.delays_secs.is_empty() {
        fail("reconnect", "delays_secs", "must contain at least one delay".to_string());
    }
    if reconnect.delays_secs.windows(2).any(|w| w[1] < w[0]) {
        fail(
            "reconnect",
            "delays_secs",
            format!("must be non-decreasing, got {:?}", reconnect.delays_secs),
        );
    }
    if reconnect.max_delay_secs == 0 {
        fail("reconnect", "max_delay_secs", "must be greater than 0".to_string());
    }
    if let Some(&over) = reconnect
        .delays_secs
        .iter()
        .find(|&&d| d > reconnect.max_delay_secs)
    {
        fail(
            "reconnect",
            "delays_secs",
            format!(
                "entry {over} exceeds max_delay_secs ({})",
                reconnect.max_delay_secs
            ),
        );
    }
    if reconnect.flap_window_secs == 0 {
        fail("reconnect", "flap_window_secs", "must be greater than 0".to_string());
    }

    if config.health.port == 0 {
        fail("health", "port", "must not be 0".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage", "database_path", "must not be empty".to_string());
    }

    let url = config.bridge.url.trim();
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        fail("bridge", "url", format!("`{url}` must start with ws:// or wss://"));
    }

    if let Some(admin) = config.bot.admin_number.as_deref()
        && config.bot.admin_digits().is_none()
    {
        fail("bot", "admin_number", format!("`{admin}` contains no digits"));
    }

    if config.bot.timezone.parse::<chrono_tz::Tz>().is_err() {
        fail(
            "bot",
            "timezone",
            format!("`{}` is not a valid IANA time zone", config.bot.timezone),
        );
    }

    if config.bot.hint_capacity == 0 {
        fail("bot", "hint_capacity", "must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
