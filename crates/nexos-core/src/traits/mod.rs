// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the gateway core and its external collaborators.
//!
//! Everything that crosses a process or network boundary (transport,
//! storage, admin relay) is reached through an `#[async_trait]` trait object
//! so the core can be driven by in-memory doubles in tests.

pub mod adapter;
pub mod relay;
pub mod store;
pub mod transport;

pub use adapter::PluginAdapter;
pub use relay::AdminRelay;
pub use store::{AuthStateStore, IgnoreStore};
pub use transport::{Session, SessionFactory, Transport};
