// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Nexos gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Fixed-key sections and their keys. `[keywords]` takes arbitrary keys and
/// is not listed.
pub const SECTION_KEYS: &[(&str, &[&str])] = &[
    (
        "bot",
        &[
            "name",
            "log_level",
            "admin_number",
            "hint_interval_secs",
            "hint_capacity",
            "default_hint",
            "timezone",
            "greet_self_on_open",
            "drain_timeout_secs",
        ],
    ),
    (
        "bridge",
        &["url", "connect_timeout_secs", "request_timeout_secs", "event_buffer"],
    ),
    ("storage", &["database_path", "wal_mode"]),
    ("telegram", &["bot_token", "admin_chat_id"]),
    ("health", &["host", "port"]),
    (
        "reconnect",
        &[
            "delays_secs",
            "max_delay_secs",
            "jitter_ms",
            "flap_window_secs",
            "flap_delay_secs",
        ],
    ),
    (
        "groups",
        &["welcome", "farewell", "use_description_as_rules", "rules", "link", "overrides"],
    ),
    ("commands", &["image_max_bytes", "image_timeout_secs"]),
];

/// Top-level Nexos configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NexosConfig {
    /// Bot identity, admin, and routing fallbacks.
    #[serde(default)]
    pub bot: BotConfig,

    /// Exact-match keyword replies (lower-cased keyword -> reply text).
    #[serde(default)]
    pub keywords: BTreeMap<String, String>,

    /// WhatsApp bridge connection settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Telegram admin relay settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// HTTP health server settings.
    #[serde(default)]
    pub health: HealthConfig,

    /// Reconnection backoff policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Group welcome and farewell settings.
    #[serde(default)]
    pub groups: GroupsConfig,

    /// Built-in command tuning.
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// Bot identity and message routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in logs and the self greeting.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// WhatsApp number of the administrator. Only digits are significant.
    /// `None` disables admin commands.
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    pub admin_number: Option<String>,

    /// Minimum seconds between two default hints to the same private chat.
    #[serde(default = "default_hint_interval_secs")]
    pub hint_interval_secs: u64,

    /// Maximum number of chats tracked by the hint throttle.
    #[serde(default = "default_hint_capacity")]
    pub hint_capacity: usize,

    /// Onboarding text sent when nothing else matched in a private chat.
    #[serde(default = "default_hint_text")]
    pub default_hint: String,

    /// IANA time zone used by the time command.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Send a thank-you note to the bot's own chat whenever the connection opens.
    #[serde(default = "default_true")]
    pub greet_self_on_open: bool,

    /// Seconds to wait for in-flight messages during shutdown.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            admin_number: None,
            hint_interval_secs: default_hint_interval_secs(),
            hint_capacity: default_hint_capacity(),
            default_hint: default_hint_text(),
            timezone: default_timezone(),
            greet_self_on_open: true,
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl BotConfig {
    /// Admin number reduced to its digits, or `None` when unset or digit-free.
    pub fn admin_digits(&self) -> Option<String> {
        let digits: String = self
            .admin_number
            .as_deref()?
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() { None } else { Some(digits) }
    }
}

fn default_bot_name() -> String {
    "nexos".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_hint_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_hint_capacity() -> usize {
    10_000
}

fn default_hint_text() -> String {
    [
        "👋 أهلاً وسهلاً! أنا بوت واتساب تابع للمطوّر *بسام حميد*.",
        "",
        "لعرض الأوامر: أرسل *مساعدة*.",
        "ولو عندك استفسار للدعم، اكتب رسالتك الآن وأنا أوصلها. 🙏",
    ]
    .join("\n")
}

fn default_timezone() -> String {
    "Asia/Aden".to_string()
}

fn default_true() -> bool {
    true
}

fn default_drain_timeout_secs() -> u64 {
    10
}

/// WhatsApp bridge (protocol sidecar) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// WebSocket URL of the bridge.
    #[serde(default = "default_bridge_url")]
    pub url: String,

    /// Seconds allowed for the WebSocket handshake.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Seconds to wait for the bridge to answer a request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Capacity of the per-session event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_bridge_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_bridge_url() -> String {
    "ws://127.0.0.1:8765".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_event_buffer() -> usize {
    256
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("nexos").join("nexos.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("nexos.db"))
        .to_string_lossy()
        .into_owned()
}

/// Telegram admin relay configuration.
///
/// The relay is active only when both the token and the chat id are set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Numeric chat id of the administrator.
    #[serde(default)]
    pub admin_chat_id: Option<i64>,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.trim().is_empty())
            && self.admin_chat_id.is_some()
    }
}

/// HTTP health server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    #[serde(default = "default_health_host")]
    pub host: String,

    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            host: default_health_host(),
            port: default_health_port(),
        }
    }
}

fn default_health_host() -> String {
    "0.0.0.0".to_string()
}

fn default_health_port() -> u16 {
    3000
}

/// Reconnection backoff configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    /// Delay table for successive attempts since the last successful open.
    #[serde(default = "default_delays_secs")]
    pub delays_secs: Vec<u64>,

    /// Delay used once the table is exhausted; no delay exceeds it.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,

    /// Upper bound of the random jitter added to each delay.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// A close this soon after an open counts as flapping.
    #[serde(default = "default_flap_window_secs")]
    pub flap_window_secs: u64,

    /// Fixed delay used after a flap.
    #[serde(default = "default_flap_delay_secs")]
    pub flap_delay_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delays_secs: default_delays_secs(),
            max_delay_secs: default_max_delay_secs(),
            jitter_ms: default_jitter_ms(),
            flap_window_secs: default_flap_window_secs(),
            flap_delay_secs: default_flap_delay_secs(),
        }
    }
}

fn default_delays_secs() -> Vec<u64> {
    vec![3, 5, 8, 13, 21]
}

fn default_max_delay_secs() -> u64 {
    30
}

fn default_jitter_ms() -> u64 {
    1000
}

fn default_flap_window_secs() -> u64 {
    10
}

fn default_flap_delay_secs() -> u64 {
    45
}

/// Welcome/farewell rules for one group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GroupRules {
    #[serde(default = "default_true")]
    pub welcome: bool,

    #[serde(default = "default_true")]
    pub farewell: bool,

    /// Prepend the group description to the rules.
    #[serde(default = "default_true")]
    pub use_description_as_rules: bool,

    #[serde(default)]
    pub rules: Vec<String>,

    #[serde(default)]
    pub link: Option<String>,
}

impl Default for GroupRules {
    fn default() -> Self {
        Self {
            welcome: true,
            farewell: true,
            use_description_as_rules: true,
            rules: Vec::new(),
            link: None,
        }
    }
}

/// Group greeting configuration: the default rules plus per-group overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GroupsConfig {
    #[serde(default = "default_true")]
    pub welcome: bool,

    #[serde(default = "default_true")]
    pub farewell: bool,

    #[serde(default = "default_true")]
    pub use_description_as_rules: bool,

    #[serde(default = "default_group_rules")]
    pub rules: Vec<String>,

    #[serde(default = "default_group_link")]
    pub link: Option<String>,

    /// Complete replacements keyed by group JID.
    #[serde(default)]
    pub overrides: BTreeMap<String, GroupRules>,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            welcome: true,
            farewell: true,
            use_description_as_rules: true,
            rules: default_group_rules(),
            link: default_group_link(),
            overrides: BTreeMap::new(),
        }
    }
}

impl GroupsConfig {
    /// Effective rules for a group: its override if present, else the defaults.
    pub fn rules_for(&self, group_id: &str) -> GroupRules {
        self.overrides
            .get(group_id)
            .cloned()
            .unwrap_or_else(|| GroupRules {
                welcome: self.welcome,
                farewell: self.farewell,
                use_description_as_rules: self.use_description_as_rules,
                rules: self.rules.clone(),
                link: self.link.clone(),
            })
    }
}

fn default_group_rules() -> Vec<String> {
    vec![
        "الرجاء الالتزام بالأدب العام وعدم إرسال السبام.".to_string(),
        "المواضيع خارج الاهتمام تُرسل في أوقات محددة فقط.".to_string(),
        "احترام آراء الآخرين والابتعاد عن الجدل الحاد.".to_string(),
    ]
}

fn default_group_link() -> Option<String> {
    Some("https://whatsapp.com/channel/0029VakGg7g1dAvzb2edgI05".to_string())
}

/// Built-in command settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsConfig {
    /// Largest image the image command will download.
    #[serde(default = "default_image_max_bytes")]
    pub image_max_bytes: u64,

    /// Seconds allowed for the image download.
    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            image_max_bytes: default_image_max_bytes(),
            image_timeout_secs: default_image_timeout_secs(),
        }
    }
}

fn default_image_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_image_timeout_secs() -> u64 {
    20
}

/// Accepts either a string or a bare integer.
///
/// Environment overrides like `ADMIN_WA=967713121581` arrive as numbers.
fn de_opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Text(String),
        Number(u64),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_keys_are_all_accepted() {
        for (section, keys) in SECTION_KEYS {
            for key in *keys {
                // An empty inline table is the wrong type for every scalar key,
                // so only an unknown key fails with "unknown field".
                let toml = format!("[{section}]\n{key} = {{}}\n");
                if let Err(e) = toml::from_str::<NexosConfig>(&toml) {
                    assert!(
                        !e.to_string().contains("unknown field"),
                        "{section}.{key} rejected: {e}"
                    );
                }
            }
        }
    }

    #[test]
    fn section_keys_cover_serialized_defaults() {
        let value = toml::Value::try_from(NexosConfig::default()).unwrap();
        for (section, body) in value.as_table().unwrap() {
            if section == "keywords" {
                continue;
            }
            let (_, keys) = SECTION_KEYS
                .iter()
                .find(|(name, _)| name == section)
                .unwrap_or_else(|| panic!("section [{section}] missing"));
            for key in body.as_table().unwrap().keys() {
                assert!(keys.contains(&key.as_str()), "{section}.{key} missing");
            }
        }
    }

    #[test]
    fn admin_digits_strips_formatting() {
        let bot = BotConfig {
            admin_number: Some("+967 713-121-581".into()),
            ..Default::default()
        };
        assert_eq!(bot.admin_digits().as_deref(), Some("967713121581"));
    }

    #[test]
    fn admin_digits_none_without_digits() {
        let bot = BotConfig {
            admin_number: Some("admin".into()),
            ..Default::default()
        };
        assert_eq!(bot.admin_digits(), None);
        assert_eq!(BotConfig::default().admin_digits(), None);
    }

    #[test]
    fn admin_number_accepts_integers() {
        let config: NexosConfig = toml::from_str("[bot]\nadmin_number = 967713121581\n").unwrap();
        assert_eq!(config.bot.admin_number.as_deref(), Some("967713121581"));
    }

    #[test]
    fn telegram_requires_token_and_chat() {
        let mut telegram = TelegramConfig::default();
        assert!(!telegram.is_configured());
        telegram.bot_token = Some("123:ABC".into());
        assert!(!telegram.is_configured());
        telegram.admin_chat_id = Some(42);
        assert!(telegram.is_configured());
    }

    #[test]
    fn group_override_replaces_defaults() {
        let toml_str = r#"
[groups.overrides."1203@g.us"]
welcome = false
rules = ["custom"]
"#;
        let config: NexosConfig = toml::from_str(toml_str).unwrap();
        let custom = config.groups.rules_for("1203@g.us");
        assert!(!custom.welcome);
        assert!(custom.farewell);
        assert_eq!(custom.rules, vec!["custom"]);
        assert_eq!(custom.link, None);

        let fallback = config.groups.rules_for("other@g.us");
        assert!(fallback.welcome);
        assert_eq!(fallback.rules.len(), 3);
        assert!(fallback.link.is_some());
    }
}
