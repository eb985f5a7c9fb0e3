// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for the Nexos gateway.
//!
//! Uses the metrics-rs facade with the Prometheus exporter.
//! Metrics are rendered as Prometheus text format via the `render()` method,
//! which is exposed through the health server's /metrics endpoint.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use nexos_core::traits::PluginAdapter;
use nexos_core::types::{AdapterType, HealthStatus};
use nexos_core::NexosError;

pub use recording::{
    record_challenge, record_command, record_message, record_reconnect, set_connection_open,
    set_memory_heap, set_memory_resident,
};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, NexosError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            NexosError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();
        recording::set_connection_open(false);

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, NexosError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NexosError> {
        Ok(())
    }
}
