// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP health and metrics endpoints for the Nexos gateway.
//!
//! The server is read-only: it observes the connection supervisor through a
//! `watch` channel and renders metrics on demand. It never touches the
//! transport session.

pub mod handlers;
pub mod server;

pub use server::{HealthState, MetricsRender, ServerConfig, router, start_server};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use nexos_core::{ConnectionPhase, ConnectionSnapshot};
    use tokio::sync::watch;
    use tower::ServiceExt;

    use super::*;

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("user-agent", "UptimeRobot/2.0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_reports_running() {
        let (_tx, rx) = watch::channel(ConnectionSnapshot::default());
        let (status, body) = get(router(HealthState::new(rx)), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "WhatsApp Bot running");
    }

    #[tokio::test]
    async fn healthz_follows_connection_phase() {
        let (tx, rx) = watch::channel(ConnectionSnapshot::default());
        let state = HealthState::new(rx);

        let (_, body) = get(router(state.clone()), "/healthz").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["connection"], "connecting");
        assert!(json["uptime_secs"].is_u64());

        tx.send_replace(ConnectionSnapshot {
            phase: ConnectionPhase::LoggedOut,
            attempt_count: 0,
            reconnect_delay: Some(Duration::from_secs(3)),
        });
        let (status, body) = get(router(state), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["connection"], "logged_out");
    }

    #[tokio::test]
    async fn metrics_rendered_when_enabled() {
        let (_tx, rx) = watch::channel(ConnectionSnapshot::default());
        let (status, _) = get(router(HealthState::new(rx.clone())), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let render: MetricsRender = Arc::new(|| "nexos_connection_open 1\n".to_string());
        let (status, body) = get(router(HealthState::new(rx).with_metrics(render)), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("nexos_connection_open 1"));
    }
}
