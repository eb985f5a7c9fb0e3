// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle state machine.
//!
//! The supervisor reacts to login challenges, opens and closes reported by
//! the transport and decides whether (and when) the session is re-created.
//! It never touches the session itself; the bot loop acts on its decisions.

use std::sync::Arc;
use std::time::Duration;

use nexos_core::types::{ConnectionStatus, ConnectionUpdate, DisconnectCause};
use nexos_core::{AdminRelay, ConnectionPhase, ConnectionSnapshot};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::backoff::BackoffPolicy;
use crate::challenge;

/// Relay text sent when the account was logged out.
pub const LOGGED_OUT_NOTICE: &str =
    "⚠️ WhatsApp session logged out. Run `nexos auth reset` and restart to scan a new QR.";

/// Mutable connection state. Owned by the supervisor alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    pub attempt_count: u32,
    pub last_open: Option<Instant>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            phase: ConnectionPhase::Connecting,
            attempt_count: 0,
            last_open: None,
        }
    }
}

/// Why a reconnect was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectKind {
    Transient,
    Flap,
}

impl ReconnectKind {
    pub fn label(&self) -> &'static str {
        match self {
            ReconnectKind::Transient => "transient",
            ReconnectKind::Flap => "flap",
        }
    }
}

/// What the bot loop should do after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorDecision {
    /// Keep going with the current session.
    Continue,
    /// Re-create the session after `delay`.
    Reconnect {
        delay: Duration,
        kind: ReconnectKind,
    },
    /// Logged out; stay down until an operator logs in again.
    Stop,
}

pub struct ConnectionSupervisor {
    policy: BackoffPolicy,
    state: ConnectionState,
    relay: Option<Arc<dyn AdminRelay>>,
    snapshot: watch::Sender<ConnectionSnapshot>,
}

impl ConnectionSupervisor {
    pub fn new(policy: BackoffPolicy, relay: Option<Arc<dyn AdminRelay>>) -> Self {
        let (snapshot, _) = watch::channel(ConnectionSnapshot::default());
        Self {
            policy,
            state: ConnectionState::default(),
            relay,
            snapshot,
        }
    }

    /// Receiver for the published connection snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Marks the start of a (re)connect attempt.
    pub fn begin_connect(&mut self) {
        self.state.phase = ConnectionPhase::Connecting;
        let last_delay = self.snapshot.borrow().reconnect_delay;
        self.publish(last_delay);
    }

    /// Applies one connection update and returns the resulting decision.
    ///
    /// A single update may carry both a challenge and a status change; the
    /// challenge is relayed in the background and never delays the decision.
    pub fn handle_update(&mut self, update: &ConnectionUpdate, now: Instant) -> SupervisorDecision {
        if let Some(qr) = update.qr.as_ref() {
            info!("login challenge issued");
            nexos_prometheus::record_challenge();
            tokio::spawn(challenge::deliver(self.relay.clone(), qr.clone()));
        }

        match update.connection {
            Some(ConnectionStatus::Open) => {
                self.on_open(now);
                SupervisorDecision::Continue
            }
            Some(ConnectionStatus::Close) => self.on_close(update, now),
            Some(ConnectionStatus::Connecting) => {
                debug!("transport connecting");
                SupervisorDecision::Continue
            }
            None => SupervisorDecision::Continue,
        }
    }

    /// The factory could not produce a session; handled as a transient close.
    pub fn session_failed(&mut self, now: Instant) -> SupervisorDecision {
        self.on_close(&ConnectionUpdate::closed(None, "session creation failed"), now)
    }

    fn on_open(&mut self, now: Instant) {
        self.state.phase = ConnectionPhase::Open;
        self.state.attempt_count = 0;
        self.state.last_open = Some(now);
        nexos_prometheus::set_connection_open(true);
        self.publish(None);
        info!("connected to WhatsApp");
    }

    fn on_close(&mut self, update: &ConnectionUpdate, now: Instant) -> SupervisorDecision {
        if matches!(
            self.state.phase,
            ConnectionPhase::Closed | ConnectionPhase::LoggedOut
        ) {
            debug!(phase = %self.state.phase, "close while already down, ignoring");
            return SupervisorDecision::Continue;
        }

        nexos_prometheus::set_connection_open(false);
        let info = update.last_disconnect.as_ref();
        let code = info.and_then(|i| i.status_code);

        if DisconnectCause::classify(info) == DisconnectCause::LoggedOut {
            self.state.phase = ConnectionPhase::LoggedOut;
            self.publish(None);
            nexos_prometheus::record_reconnect("logged_out");
            error!(code = ?code, "logged out; scan a new QR code to log in again");
            if let Some(relay) = self.relay.clone() {
                tokio::spawn(async move {
                    if let Err(e) = relay.send_text(LOGGED_OUT_NOTICE).await {
                        error!(error = %e, "failed to relay logout notice");
                    }
                });
            }
            return SupervisorDecision::Stop;
        }

        self.state.phase = ConnectionPhase::Closed;
        let since_open = self.state.last_open.map(|t| now.saturating_duration_since(t));
        let mut rng = rand::thread_rng();

        let (delay, kind) = if self.policy.is_flap(since_open) {
            let delay = self.policy.flap_delay(&mut rng);
            warn!(
                code = ?code,
                delay_ms = delay.as_millis() as u64,
                uptime_ms = since_open.unwrap_or_default().as_millis() as u64,
                "connection flapping, backing off"
            );
            (delay, ReconnectKind::Flap)
        } else {
            self.state.attempt_count = self.state.attempt_count.saturating_add(1);
            let base = self.policy.base_delay(self.state.attempt_count);
            let delay = self.policy.with_jitter(base, &mut rng);
            warn!(
                code = ?code,
                delay_ms = delay.as_millis() as u64,
                attempt = self.state.attempt_count,
                "connection closed, reconnecting"
            );
            (delay, ReconnectKind::Transient)
        };

        nexos_prometheus::record_reconnect(kind.label());
        self.publish(Some(delay));
        SupervisorDecision::Reconnect { delay, kind }
    }

    fn publish(&self, reconnect_delay: Option<Duration>) {
        self.snapshot.send_replace(ConnectionSnapshot {
            phase: self.state.phase,
            attempt_count: self.state.attempt_count,
            reconnect_delay,
        });
    }
}
