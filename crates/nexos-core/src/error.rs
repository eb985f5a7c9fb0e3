// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Nexos chat-bot gateway.

use thiserror::Error;

/// The primary error type used across all Nexos traits and core operations.
#[derive(Debug, Error)]
pub enum NexosError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, migration failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport errors (bridge connection, send failure, protocol frame errors).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Admin relay errors (Telegram API failure, rendering the login challenge).
    #[error("relay error: {message}")]
    Relay {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A command handler failed in a way it could not report to the user.
    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NexosError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        NexosError::Transport {
            message: message.into(),
            source: None,
        }
    }
}
