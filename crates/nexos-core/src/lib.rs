// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Nexos chat-bot gateway.
//!
//! This crate provides the error type, the wire-facing message and
//! connection types, JID helpers, and the traits through which the core
//! reaches its collaborators (transport, storage, admin relay).

pub mod error;
pub mod jid;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::NexosError;
pub use types::{
    AdapterType, ConnectionPhase, ConnectionSnapshot, HealthStatus, InboundMessage, MessageId,
    OutboundContent, SendOptions, TransportEvent,
};

pub use traits::{
    AdminRelay, AuthStateStore, IgnoreStore, PluginAdapter, Session, SessionFactory, Transport,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nexos_error_has_all_variants() {
        let _config = NexosError::Config("test".into());
        let _storage = NexosError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _transport = NexosError::transport("test");
        let _relay = NexosError::Relay {
            message: "test".into(),
            source: None,
        };
        let _command = NexosError::Command {
            command: "!ping".into(),
            message: "test".into(),
        };
        let _timeout = NexosError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = NexosError::Internal("test".into());
    }

    #[test]
    fn error_messages_carry_context() {
        let err = NexosError::Command {
            command: "!poll".into(),
            message: "send failed".into(),
        };
        assert_eq!(err.to_string(), "command `!poll` failed: send failed");
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Transport,
            AdapterType::Storage,
            AdapterType::Relay,
            AdapterType::Observability,
        ] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _assert_transport(_: &dyn Transport) {}
        fn _assert_factory(_: &dyn SessionFactory) {}
        fn _assert_ignore(_: &dyn IgnoreStore) {}
        fn _assert_auth(_: &dyn AuthStateStore) {}
        fn _assert_relay(_: &dyn AdminRelay) {}
        fn _assert_adapter(_: &dyn PluginAdapter) {}
    }
}
