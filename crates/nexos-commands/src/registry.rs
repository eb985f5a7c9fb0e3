// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-to-command index built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::module::{CommandDefinition, CommandModule};

/// Read-only map from normalized token to command definition.
///
/// Each command is reachable through its name and aliases, case-insensitively,
/// with or without the leading `!`. When two commands claim the same token the
/// one loaded later wins.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    by_token: HashMap<String, Arc<CommandDefinition>>,
    definitions: Vec<Arc<CommandDefinition>>,
}

impl CommandRegistry {
    /// Normalizes and indexes `modules` in order.
    ///
    /// Modules that fail normalization are logged and skipped.
    pub fn load(modules: impl IntoIterator<Item = CommandModule>) -> Self {
        let mut registry = Self::default();
        for module in modules {
            let module_name = module.module.clone();
            match module.normalize() {
                Ok(definition) => {
                    info!(command = %definition.name, module = %module_name, "loaded command");
                    registry.insert(Arc::new(definition));
                }
                Err(e) => warn!(module = %module_name, error = %e, "skipping command module"),
            }
        }
        registry
    }

    fn insert(&mut self, definition: Arc<CommandDefinition>) {
        for token in definition.tokens() {
            if let Some(previous) = self.by_token.insert(token.clone(), Arc::clone(&definition)) {
                warn!(
                    token = %token,
                    previous = %previous.name,
                    current = %definition.name,
                    "command token overridden"
                );
            }
        }
        self.definitions.push(definition);
    }

    /// Looks up a token, ignoring case.
    pub fn resolve(&self, token: &str) -> Option<Arc<CommandDefinition>> {
        self.by_token.get(&token.to_lowercase()).cloned()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.by_token.contains_key(&token.to_lowercase())
    }

    /// Loaded definitions in load order.
    pub fn definitions(&self) -> &[Arc<CommandDefinition>] {
        &self.definitions
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}
