// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Welcome and farewell messages for group membership changes.

use std::sync::Arc;

use nexos_config::model::{GroupRules, GroupsConfig};
use nexos_core::jid;
use nexos_core::types::{GroupParticipantsUpdate, ParticipantAction};
use nexos_core::{NexosError, OutboundContent, SendOptions, Transport};
use tracing::{debug, warn};

const NO_RULES: &str = "— لا توجد قوانين محددة —";

pub struct GroupGreeter {
    config: GroupsConfig,
}

impl GroupGreeter {
    pub fn new(config: GroupsConfig) -> Self {
        Self { config }
    }

    /// Greets joiners or bids leavers farewell. Returns whether a message was sent.
    pub async fn handle(
        &self,
        transport: &Arc<dyn Transport>,
        update: &GroupParticipantsUpdate,
    ) -> Result<bool, NexosError> {
        if !jid::is_group(&update.id) || update.participants.is_empty() {
            return Ok(false);
        }
        let rules = self.config.rules_for(&update.id);
        let mentions = update.participants.clone();
        let names = mention_list(&update.participants);

        let text = match update.action {
            ParticipantAction::Add if rules.welcome => {
                let (subject, description) = match transport.group_metadata(&update.id).await {
                    Ok(meta) => (meta.subject, meta.description),
                    Err(e) => {
                        warn!(group_id = %update.id, error = %e, "group metadata fetch failed");
                        (None, None)
                    }
                };
                welcome_text(&names, subject.as_deref(), description.as_deref(), &rules)
            }
            ParticipantAction::Remove if rules.farewell => farewell_text(&names),
            _ => {
                debug!(group_id = %update.id, action = ?update.action, "no greeting for update");
                return Ok(false);
            }
        };

        transport
            .send_message(
                &update.id,
                OutboundContent::Text { text, mentions },
                SendOptions::default(),
            )
            .await?;
        Ok(true)
    }
}

fn mention_list(participants: &[String]) -> String {
    participants
        .iter()
        .map(|p| format!("@{}", jid::number_from_jid(p)))
        .collect::<Vec<_>>()
        .join("، ")
}

/// Description (when enabled) followed by the bulleted configured rules.
pub fn rules_text(rules: &GroupRules, description: Option<&str>) -> String {
    let mut parts = Vec::new();
    if rules.use_description_as_rules
        && let Some(desc) = description.map(str::trim).filter(|d| !d.is_empty())
    {
        parts.push(desc.to_string());
    }
    if !rules.rules.is_empty() {
        parts.push(
            rules
                .rules
                .iter()
                .map(|r| format!("• {r}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    if parts.is_empty() {
        NO_RULES.to_string()
    } else {
        parts.join("\n")
    }
}

pub fn welcome_text(
    names: &str,
    subject: Option<&str>,
    description: Option<&str>,
    rules: &GroupRules,
) -> String {
    let greeting = match subject.filter(|s| !s.is_empty()) {
        Some(subject) => format!("في قروب *{subject}*."),
        None => "يا أهلاً وسهلاً.".to_string(),
    };
    let link_line = rules
        .link
        .as_deref()
        .filter(|l| !l.is_empty())
        .map(|l| format!("\n🔗 رابط القروب: {l}"))
        .unwrap_or_default();

    [
        format!("مرحبًا {names}! 👋"),
        greeting,
        String::new(),
        "هذه بعض القوانين عندنا:".to_string(),
        rules_text(rules, description),
        link_line,
    ]
    .join("\n")
}

pub fn farewell_text(names: &str) -> String {
    format!("مع السلامة {names} 👋\nنتمنّى لكم التوفيق.")
}
