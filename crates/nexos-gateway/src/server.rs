// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the health endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::{Router, routing::get};
use nexos_config::model::HealthConfig;
use nexos_core::{ConnectionSnapshot, NexosError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Renders the metrics exposition text.
pub type MetricsRender = Arc<dyn Fn() -> String + Send + Sync>;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Latest connection snapshot published by the supervisor.
    pub connection: watch::Receiver<ConnectionSnapshot>,
    /// Optional Prometheus metrics render function.
    pub metrics_render: Option<MetricsRender>,
}

impl HealthState {
    pub fn new(connection: watch::Receiver<ConnectionSnapshot>) -> Self {
        Self {
            start_time: Instant::now(),
            connection,
            metrics_render: None,
        }
    }

    pub fn with_metrics(mut self, render: MetricsRender) -> Self {
        self.metrics_render = Some(render);
        self
    }
}

/// Bind address of the health server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&HealthConfig> for ServerConfig {
    fn from(config: &HealthConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Builds the router:
/// - GET / (liveness text)
/// - GET /healthz (JSON with connection phase and uptime)
/// - GET /metrics (Prometheus text)
pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(handlers::get_root))
        .route("/healthz", get(handlers::get_healthz))
        .route("/metrics", get(handlers::get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the health endpoints until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: HealthState,
    cancel: CancellationToken,
) -> Result<(), NexosError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NexosError::Transport {
            message: format!("failed to bind health server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Health server listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| NexosError::Transport {
            message: format!("health server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Health server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_from_health_section() {
        let config = ServerConfig::from(&HealthConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        });
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert_eq!(config.port, 3000);
    }

    #[tokio::test]
    async fn server_stops_on_cancel() {
        let (_tx, rx) = watch::channel(ConnectionSnapshot::default());
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let server =
            tokio::spawn(async move { start_server(&config, HealthState::new(rx), token).await });
        cancel.cancel();
        server.await.unwrap().unwrap();
    }
}
