// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin-only mute list management over chat.

use nexos_core::jid::{self, USER_SUFFIX};
use nexos_core::{IgnoreStore, NexosError};

/// `added_by` value for entries created from chat.
pub const ADDED_BY: &str = "wa-admin";

/// Maximum number of entries shown by the list command.
pub const LIST_LIMIT: usize = 100;

pub const INVALID_TARGET: &str = "❌ رقم/معرّف غير صالح.";
pub const NOT_MUTED: &str = "ℹ️ هذه المحادثة ليست في قائمة التجاهل.";
pub const EMPTY_LIST: &str = "📭 لا توجد محادثات متجاهلة.";
const LIST_HEADER: &str = "📝 قائمة التجاهل:\n\n";

/// A parsed admin instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Mute(String),
    Unmute(String),
    List,
}

impl AdminCommand {
    /// Parses lower-cased, trimmed text. Returns `None` for anything that is
    /// not an admin instruction, including a mute or unmute without target.
    pub fn parse(lowered: &str) -> Option<Self> {
        if lowered == "قائمة_التجاهل" || lowered == "muted" {
            return Some(AdminCommand::List);
        }
        let (verb, rest) = lowered.split_once(char::is_whitespace)?;
        let target = rest.trim_start();
        if target.is_empty() {
            return None;
        }
        match verb {
            "تجاهل" | "mute" => Some(AdminCommand::Mute(target.to_string())),
            "سماح" | "unmute" => Some(AdminCommand::Unmute(target.to_string())),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdminCommand::Mute(_) => "mute",
            AdminCommand::Unmute(_) => "unmute",
            AdminCommand::List => "list",
        }
    }

    /// Applies the instruction and returns the reply text.
    pub async fn execute(&self, store: &dyn IgnoreStore) -> Result<String, NexosError> {
        match self {
            AdminCommand::Mute(target) => {
                let Some(chat_id) = jid::to_jid(target) else {
                    return Ok(INVALID_TARGET.to_string());
                };
                store.upsert(&chat_id, ADDED_BY).await?;
                Ok(format!("✅ تم تجاهل المحادثة: {chat_id}"))
            }
            AdminCommand::Unmute(target) => {
                let Some(chat_id) = jid::to_jid(target) else {
                    return Ok(INVALID_TARGET.to_string());
                };
                if store.delete(&chat_id).await? > 0 {
                    Ok(format!("✅ أُلغي التجاهل عن: {chat_id}"))
                } else {
                    Ok(NOT_MUTED.to_string())
                }
            }
            AdminCommand::List => {
                let entries = store.list_recent(LIST_LIMIT).await?;
                if entries.is_empty() {
                    return Ok(EMPTY_LIST.to_string());
                }
                let lines: Vec<String> = entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| format!("{}. {} — {}", i + 1, e.chat_id, e.created_at))
                    .collect();
                Ok(format!("{LIST_HEADER}{}", lines.join("\n")))
            }
        }
    }
}

/// Whether a message comes from the configured admin number.
pub fn is_admin(admin_digits: &str, sender_id: &str, chat_id: &str) -> bool {
    if admin_digits.is_empty() {
        return false;
    }
    sender_id.contains(admin_digits) || chat_id.contains(&format!("{admin_digits}{USER_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arabic_and_english_verbs() {
        assert_eq!(
            AdminCommand::parse("تجاهل 967700"),
            Some(AdminCommand::Mute("967700".into()))
        );
        assert_eq!(
            AdminCommand::parse("unmute   123@g.us"),
            Some(AdminCommand::Unmute("123@g.us".into()))
        );
        assert_eq!(AdminCommand::parse("قائمة_التجاهل"), Some(AdminCommand::List));
        assert_eq!(AdminCommand::parse("muted"), Some(AdminCommand::List));
    }

    #[test]
    fn verb_without_target_is_not_admin() {
        assert_eq!(AdminCommand::parse("تجاهل"), None);
        assert_eq!(AdminCommand::parse("mute"), None);
        assert_eq!(AdminCommand::parse("hello there"), None);
    }

    #[test]
    fn admin_detection_matches_sender_or_chat() {
        assert!(is_admin("967713", "967713@s.whatsapp.net", "967713@s.whatsapp.net"));
        assert!(is_admin("967713", "967713", "1@g.us"));
        assert!(!is_admin("967713", "5550001", "1@g.us"));
        assert!(!is_admin("", "967713", "1@g.us"));
    }
}
