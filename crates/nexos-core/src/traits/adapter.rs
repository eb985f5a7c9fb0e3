// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait implemented by long-lived infrastructure adapters.

use async_trait::async_trait;

use crate::error::NexosError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health, and lifecycle for an infrastructure adapter
/// (storage backend, bridge transport, admin relay, metrics recorder).
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, NexosError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), NexosError>;
}
