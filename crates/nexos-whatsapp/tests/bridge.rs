// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drives `BridgeSessionFactory` against an in-process WebSocket bridge.

use futures::{SinkExt, StreamExt};
use nexos_config::model::BridgeConfig;
use nexos_core::types::{AuthState, ConnectionStatus, HealthStatus};
use nexos_core::{
    NexosError, OutboundContent, PluginAdapter, SendOptions, SessionFactory, Transport,
    TransportEvent,
};
use nexos_test_utils::builders::private_text;
use nexos_whatsapp::BridgeSessionFactory;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

async fn listener() -> (TcpListener, BridgeConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = BridgeConfig {
        url: format!("ws://127.0.0.1:{port}"),
        connect_timeout_secs: 5,
        request_timeout_secs: 5,
        event_buffer: 16,
    };
    (listener, config)
}

fn text_frame(message: Message) -> serde_json::Value {
    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn session_round_trip_through_bridge() {
    let (listener, config) = listener().await;

    let bridge = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();

        let hello = text_frame(ws.next().await.unwrap().unwrap());
        assert_eq!(hello["type"], "hello");
        assert_eq!(hello["auth"]["creds"]["registered"], true);

        ws.send(Message::text(
            json!({"type": "connection.update", "connection": "open", "me": "967700:4@s.whatsapp.net"})
                .to_string(),
        ))
        .await
        .unwrap();

        let send = text_frame(ws.next().await.unwrap().unwrap());
        assert_eq!(send["type"], "send");
        assert_eq!(send["chatId"], "967711@s.whatsapp.net");
        assert_eq!(send["content"]["text"], "pong");
        assert_eq!(send["quoted"]["key"]["remoteJid"], "967711@s.whatsapp.net");
        ws.send(Message::text(
            json!({"type": "result", "id": send["id"], "ok": true, "data": {"messageId": "3EB0"}})
                .to_string(),
        ))
        .await
        .unwrap();

        ws.close(None).await.unwrap();
    });

    let factory = BridgeSessionFactory::new(config);
    let auth = AuthState {
        creds: Some(json!({"registered": true})),
        keys: Vec::new(),
    };
    let mut session = factory.create_session(auth).await.unwrap();
    assert_eq!(factory.health_check().await.unwrap(), HealthStatus::Healthy);

    match session.events.recv().await.unwrap() {
        TransportEvent::Connection(update) => {
            assert_eq!(update.connection, Some(ConnectionStatus::Open));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(
        session.transport.self_id().as_deref(),
        Some("967700:4@s.whatsapp.net")
    );

    let inbound = private_text("967711@s.whatsapp.net", "ping");
    let id = session
        .transport
        .send_message(
            "967711@s.whatsapp.net",
            OutboundContent::text("pong"),
            SendOptions::quoting(&inbound),
        )
        .await
        .unwrap();
    assert_eq!(id.0, "3EB0");

    // The bridge hangs up: a status-less close arrives, then the stream ends.
    match session.events.recv().await.unwrap() {
        TransportEvent::Connection(update) => {
            assert_eq!(update.connection, Some(ConnectionStatus::Close));
            assert_eq!(update.last_disconnect.unwrap().status_code, None);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(session.events.recv().await.is_none());
    assert!(matches!(
        factory.health_check().await.unwrap(),
        HealthStatus::Degraded(_)
    ));

    bridge.await.unwrap();
}

#[tokio::test]
async fn unreachable_bridge_is_a_transport_error() {
    let (listener, config) = listener().await;
    drop(listener);

    let factory = BridgeSessionFactory::new(config);
    let err = factory
        .create_session(AuthState::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, NexosError::Transport { .. }), "{err}");
}
