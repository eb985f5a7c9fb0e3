// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nexos config check`, `nexos commands` and `nexos auth reset`.

use nexos_commands::{CommandRegistry, builtin};
use nexos_config::NexosConfig;
use nexos_core::{AuthStateStore, NexosError};
use nexos_storage::SqliteStorage;

/// Prints the effective settings after a successful load.
pub fn print_config_summary(config: &NexosConfig) {
    println!("nexos: configuration OK");
    for line in summary_lines(config) {
        println!("  {line}");
    }
}

fn summary_lines(config: &NexosConfig) -> Vec<String> {
    vec![
        format!("bot.name = {}", config.bot.name),
        format!("bot.log_level = {}", config.bot.log_level),
        format!(
            "bot.admin_number = {}",
            config.bot.admin_number.as_deref().unwrap_or("(none)")
        ),
        format!("bot.timezone = {}", config.bot.timezone),
        format!("bridge.url = {}", config.bridge.url),
        format!("storage.database_path = {}", config.storage.database_path),
        format!("health = {}:{}", config.health.host, config.health.port),
        format!(
            "telegram relay = {}",
            if config.telegram.is_configured() {
                "enabled"
            } else {
                "disabled"
            }
        ),
        format!("keywords = {}", config.keywords.len()),
        format!("reconnect.delays_secs = {:?}", config.reconnect.delays_secs),
    ]
}

/// Prints each command with every token it resolves from.
pub fn list_commands(config: &NexosConfig) -> Result<(), NexosError> {
    let registry = CommandRegistry::load(builtin::all(config)?);
    for definition in registry.definitions() {
        println!("{}", definition.name);
        println!("  tokens: {}", definition.tokens().join(", "));
    }
    Ok(())
}

/// Clears stored credentials and signal keys.
pub async fn reset_auth(config: &NexosConfig) -> Result<(), NexosError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    storage.clear().await?;
    println!(
        "nexos: session cleared ({}); a new QR code will be issued on the next start",
        config.storage.database_path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use nexos_core::types::KeyUpdate;

    use super::*;

    #[test]
    fn summary_reports_relay_state() {
        let mut config = NexosConfig::default();
        let lines = summary_lines(&config);
        assert!(lines.contains(&"telegram relay = disabled".to_string()));

        config.telegram.bot_token = Some("123:abc".into());
        config.telegram.admin_chat_id = Some(42);
        let lines = summary_lines(&config);
        assert!(lines.contains(&"telegram relay = enabled".to_string()));
    }

    #[test]
    fn builtin_commands_list() {
        assert!(list_commands(&NexosConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn reset_forgets_stored_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NexosConfig::default();
        config.storage.database_path = dir.path().join("nexos.db").display().to_string();

        {
            let storage = SqliteStorage::new(config.storage.clone());
            storage.initialize().await.unwrap();
            storage
                .save_creds(&serde_json::json!({"registered": true}))
                .await
                .unwrap();
            storage
                .apply_key_updates(&[KeyUpdate {
                    key_type: "pre-key".into(),
                    id: "1".into(),
                    value: Some(serde_json::json!({"k": 1})),
                }])
                .await
                .unwrap();
        }

        reset_auth(&config).await.unwrap();

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await.unwrap();
        let auth = storage.load().await.unwrap();
        assert!(!auth.has_creds());
        assert!(auth.keys.is_empty());
    }
}
