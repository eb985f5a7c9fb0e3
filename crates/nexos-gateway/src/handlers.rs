// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the health endpoints.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use nexos_core::ConnectionPhase;
use serde::Serialize;

use crate::server::HealthState;

/// Body of `GET /`.
pub const ROOT_TEXT: &str = "WhatsApp Bot running";

/// Response body for GET /healthz.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `true` while the process serves requests.
    pub ok: bool,
    pub connection: ConnectionPhase,
    pub uptime_secs: u64,
}

/// GET /
pub async fn get_root() -> &'static str {
    ROOT_TEXT
}

/// GET /healthz
///
/// Reports the supervised connection phase. The caller's user agent is logged
/// so platform health checks are visible in the logs.
pub async fn get_healthz(
    State(state): State<HealthState>,
    headers: HeaderMap,
) -> Json<HealthResponse> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::info!(user_agent, "health check");

    let phase = state.connection.borrow().phase;
    Json(HealthResponse {
        ok: true,
        connection: phase,
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
pub async fn get_metrics(State(state): State<HealthState>) -> Response {
    match &state.metrics_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes_phase_in_snake_case() {
        let resp = HealthResponse {
            ok: true,
            connection: ConnectionPhase::LoggedOut,
            uptime_secs: 42,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"ok":true,"connection":"logged_out","uptime_secs":42}"#
        );
    }
}
