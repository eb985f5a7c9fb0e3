// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for WhatsApp JIDs (`<number>@s.whatsapp.net`, `<id>@g.us`).

/// Chat id used for status broadcasts. Never answered.
pub const STATUS_BROADCAST: &str = "status@broadcast";

/// Suffix of individual user JIDs.
pub const USER_SUFFIX: &str = "@s.whatsapp.net";

/// Suffix of group JIDs.
pub const GROUP_SUFFIX: &str = "@g.us";

pub fn is_group(jid: &str) -> bool {
    jid.ends_with(GROUP_SUFFIX)
}

/// Resolves the sender of a message: the group participant if present,
/// otherwise the chat itself, with any `:device` suffix cut off.
pub fn normalize_sender(participant: Option<&str>, remote_jid: &str) -> String {
    let raw = participant
        .filter(|p| !p.is_empty())
        .unwrap_or(remote_jid);
    raw.split(':').next().unwrap_or_default().to_string()
}

/// Keeps only ASCII digits.
pub fn digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Turns admin input into a JID.
///
/// Input containing `@` is taken as a JID already. Otherwise the digits are
/// extracted and suffixed with [`USER_SUFFIX`]. Returns `None` when nothing
/// usable remains.
pub fn to_jid(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains('@') {
        return Some(trimmed.to_string());
    }
    let digits = digits(trimmed);
    if digits.is_empty() {
        None
    } else {
        Some(format!("{digits}{USER_SUFFIX}"))
    }
}

/// Phone number part of a JID (`967700:3@s.whatsapp.net` -> `967700`).
pub fn number_from_jid(jid: &str) -> &str {
    let user = jid.split('@').next().unwrap_or_default();
    user.split(':').next().unwrap_or_default()
}
