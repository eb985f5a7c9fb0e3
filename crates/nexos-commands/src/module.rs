// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command definition shapes and their normalization.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::context::CommandHandler;

/// How a module contributes its command.
#[derive(Clone)]
pub enum CommandShape {
    /// Just a handler. Name and alias are derived from the module name.
    Handler(Arc<dyn CommandHandler>),
    /// A declaration; missing parts fall back to module-derived defaults.
    Declared {
        name: Option<String>,
        aliases: Option<Vec<String>>,
        run: Option<Arc<dyn CommandHandler>>,
    },
}

/// A command as contributed, before normalization.
#[derive(Clone)]
pub struct CommandModule {
    /// Base name of the module, e.g. `echo`.
    pub module: String,
    pub shape: CommandShape,
}

impl CommandModule {
    pub fn handler(module: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            module: module.into(),
            shape: CommandShape::Handler(handler),
        }
    }

    pub fn declared(
        module: impl Into<String>,
        name: impl Into<String>,
        aliases: &[&str],
        run: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            module: module.into(),
            shape: CommandShape::Declared {
                name: Some(name.into()),
                aliases: Some(aliases.iter().map(|a| a.to_string()).collect()),
                run: Some(run),
            },
        }
    }

    /// Resolves the shape into a uniform definition.
    ///
    /// The default name is `!<module>` and the default alias list is `[<module>]`.
    pub fn normalize(self) -> Result<CommandDefinition, ModuleError> {
        let default_name = format!("!{}", self.module);
        match self.shape {
            CommandShape::Handler(handler) => Ok(CommandDefinition {
                name: default_name,
                aliases: vec![self.module],
                handler,
            }),
            CommandShape::Declared { name, aliases, run } => {
                let handler = run.ok_or_else(|| ModuleError::MissingRun {
                    module: self.module.clone(),
                })?;
                Ok(CommandDefinition {
                    name: name.filter(|n| !n.trim().is_empty()).unwrap_or(default_name),
                    aliases: aliases.unwrap_or_else(|| vec![self.module]),
                    handler,
                })
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleError {
    #[error("command module `{module}` has no run handler")]
    MissingRun { module: String },
}

/// A normalized command.
pub struct CommandDefinition {
    /// Primary invocation token as declared.
    pub name: String,
    pub aliases: Vec<String>,
    pub handler: Arc<dyn CommandHandler>,
}

impl CommandDefinition {
    /// Every spelling this command answers to: the lower-cased name and
    /// aliases plus their `!`-toggled forms, without duplicates.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for raw in std::iter::once(&self.name).chain(self.aliases.iter()) {
            let lowered = raw.trim().to_lowercase();
            if lowered.is_empty() {
                continue;
            }
            let toggled = match lowered.strip_prefix('!') {
                Some(bare) => bare.to_string(),
                None => format!("!{lowered}"),
            };
            for token in [lowered, toggled] {
                if !token.is_empty() && token != "!" && !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }
        tokens
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}
