// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session factory double.
//!
//! Every session shares one [`MockTransport`]; tests push events into the
//! most recent session through [`MockSessionFactory::emit`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use nexos_core::types::{AuthState, TransportEvent};
use nexos_core::{NexosError, Session, SessionFactory, Transport};

use crate::mock_transport::MockTransport;

const EVENT_BUFFER: usize = 64;

pub struct MockSessionFactory {
    transport: Arc<MockTransport>,
    senders: Mutex<Vec<mpsc::Sender<TransportEvent>>>,
    auth_seen: Mutex<Vec<AuthState>>,
    failures_left: AtomicUsize,
}

impl MockSessionFactory {
    pub fn new(transport: Arc<MockTransport>) -> Self {
        Self {
            transport,
            senders: Mutex::new(Vec::new()),
            auth_seen: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(0),
        }
    }

    pub fn transport(&self) -> Arc<MockTransport> {
        Arc::clone(&self.transport)
    }

    /// The next `count` calls to `create_session` fail.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Number of sessions created so far.
    pub async fn session_count(&self) -> usize {
        self.senders.lock().await.len()
    }

    /// Auth states passed to `create_session`, in call order.
    pub async fn auth_states(&self) -> Vec<AuthState> {
        self.auth_seen.lock().await.clone()
    }

    /// Sends an event on the latest session. Returns `false` when there is
    /// no session or its receiver is gone.
    pub async fn emit(&self, event: TransportEvent) -> bool {
        let sender = self.senders.lock().await.last().cloned();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Drops the sender of the latest session so its stream ends.
    pub async fn end_latest(&self) {
        let mut senders = self.senders.lock().await;
        if let Some(last) = senders.last_mut() {
            let (closed, _) = mpsc::channel(1);
            *last = closed;
        }
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn create_session(&self, auth: AuthState) -> Result<Session, NexosError> {
        self.auth_seen.lock().await.push(auth);

        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(NexosError::transport("mock session creation failure"));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        self.senders.lock().await.push(tx);
        Ok(Session {
            transport: Arc::clone(&self.transport) as Arc<dyn Transport>,
            events: rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexos_core::types::ConnectionUpdate;

    #[tokio::test]
    async fn emits_to_latest_session() {
        let factory = MockSessionFactory::new(Arc::new(MockTransport::new()));
        assert!(!factory.emit(TransportEvent::CredsUpdate(serde_json::json!({}))).await);

        let mut session = factory.create_session(AuthState::default()).await.unwrap();
        let update = ConnectionUpdate::closed(Some(500), "boom");
        assert!(factory.emit(TransportEvent::Connection(update.clone())).await);
        assert_eq!(
            session.events.recv().await,
            Some(TransportEvent::Connection(update))
        );
    }

    #[tokio::test]
    async fn scripted_failures() {
        let factory = MockSessionFactory::new(Arc::new(MockTransport::new()));
        factory.fail_next(1);
        assert!(factory.create_session(AuthState::default()).await.is_err());
        assert!(factory.create_session(AuthState::default()).await.is_ok());
        assert_eq!(factory.session_count().await, 1);
        assert_eq!(factory.auth_states().await.len(), 2);
    }
}
