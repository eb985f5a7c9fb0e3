// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session supervision and the event loop for the Nexos gateway.
//!
//! The [`BotLoop`] is the central coordinator that:
//! - Creates transport sessions from stored credentials
//! - Feeds connection updates to the [`ConnectionSupervisor`]
//! - Schedules reconnects without blocking event handling
//! - Queues inbound messages for the sequential message worker
//! - Persists rotated credentials and keys
//! - Handles graceful shutdown

pub mod backoff;
pub mod challenge;
pub mod groups;
pub mod shutdown;
pub mod supervisor;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use nexos_config::NexosConfig;
use nexos_core::jid::{self, USER_SUFFIX};
use nexos_core::types::{ConnectionStatus, ConnectionUpdate};
use nexos_core::{
    AuthStateStore, ConnectionSnapshot, NexosError, OutboundContent, SendOptions, Session,
    SessionFactory, Transport, TransportEvent,
};
use nexos_router::MessageRouter;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use backoff::BackoffPolicy;
pub use groups::GroupGreeter;
pub use supervisor::{ConnectionSupervisor, SupervisorDecision};

use crate::worker::Work;

/// Loop behaviour taken from configuration.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub greet_self_on_open: bool,
    pub timezone: Tz,
    pub drain_timeout: Duration,
}

impl LoopSettings {
    pub fn from_config(config: &NexosConfig) -> Result<Self, NexosError> {
        let timezone = config.bot.timezone.parse::<Tz>().map_err(|_| {
            NexosError::Config(format!("unknown time zone `{}`", config.bot.timezone))
        })?;
        Ok(Self {
            greet_self_on_open: config.bot.greet_self_on_open,
            timezone,
            drain_timeout: Duration::from_secs(config.bot.drain_timeout_secs),
        })
    }
}

/// Text the bot sends to its own account once connected.
pub fn self_greeting(now: DateTime<Tz>) -> String {
    format!(
        "*Thank you for Using Nexos Bot!* \n\n - *Official Discord Server:* https://discord.com/invite/A3euTAVqHv \n - *Server Time:* {} \n\n We ❤️ contributions!",
        now.format("%Y/%m/%d %H:%M:%S")
    )
}

/// Owns the current session and drives it until shutdown.
pub struct BotLoop {
    factory: Arc<dyn SessionFactory>,
    auth: Arc<dyn AuthStateStore>,
    supervisor: ConnectionSupervisor,
    router: Arc<MessageRouter>,
    greeter: Arc<GroupGreeter>,
    settings: LoopSettings,
}

impl BotLoop {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        auth: Arc<dyn AuthStateStore>,
        supervisor: ConnectionSupervisor,
        router: Arc<MessageRouter>,
        greeter: Arc<GroupGreeter>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            factory,
            auth,
            supervisor,
            router,
            greeter,
            settings,
        }
    }

    /// Receiver for connection snapshots, for the health endpoint.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.supervisor.subscribe()
    }

    /// Runs until `cancel` fires, then drains the message queue.
    ///
    /// A logged-out session does not end the loop; it idles until shutdown
    /// so the health endpoint keeps reporting the state.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), NexosError> {
        info!("bot loop running");

        let (work_tx, work_rx) = mpsc::unbounded_channel();
        let worker = worker::spawn(Arc::clone(&self.router), Arc::clone(&self.greeter), work_rx);

        let mut active: Option<Session> = None;
        let reconnect = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(reconnect);
        let mut reconnect_armed = false;

        if let Some(delay) = self.connect(&mut active).await {
            reconnect.as_mut().reset(Instant::now() + delay);
            reconnect_armed = true;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping bot loop");
                    break;
                }
                () = &mut reconnect, if reconnect_armed => {
                    reconnect_armed = false;
                    if let Some(delay) = self.connect(&mut active).await {
                        reconnect.as_mut().reset(Instant::now() + delay);
                        reconnect_armed = true;
                    }
                }
                event = next_event(&mut active) => {
                    let transport = active.as_ref().map(|s| Arc::clone(&s.transport));
                    let decision = match (event, transport) {
                        (Some(event), Some(transport)) => {
                            self.handle_event(event, transport, &work_tx).await
                        }
                        _ => {
                            debug!("session event stream ended");
                            active = None;
                            self.supervisor.handle_update(
                                &ConnectionUpdate::closed(None, "event stream ended"),
                                Instant::now(),
                            )
                        }
                    };
                    if let SupervisorDecision::Reconnect { delay, .. } = decision {
                        reconnect.as_mut().reset(Instant::now() + delay);
                        reconnect_armed = true;
                    }
                }
            }
        }

        drop(active);
        drop(work_tx);
        shutdown::drain_worker(worker, self.settings.drain_timeout).await;
        info!("bot loop stopped");
        Ok(())
    }

    /// Creates a session from stored credentials. Returns a reconnect delay on failure.
    async fn connect(&mut self, active: &mut Option<Session>) -> Option<Duration> {
        self.supervisor.begin_connect();
        *active = None;

        let created = match self.auth.load().await {
            Ok(auth) => {
                if !auth.has_creds() {
                    warn!("no stored session, a QR code will be issued on first login");
                }
                self.factory.create_session(auth).await
            }
            Err(e) => Err(e),
        };

        match created {
            Ok(session) => {
                info!("transport session created");
                *active = Some(session);
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to create transport session");
                match self.supervisor.session_failed(Instant::now()) {
                    SupervisorDecision::Reconnect { delay, .. } => Some(delay),
                    _ => None,
                }
            }
        }
    }

    async fn handle_event(
        &mut self,
        event: TransportEvent,
        transport: Arc<dyn Transport>,
        work: &mpsc::UnboundedSender<Work>,
    ) -> SupervisorDecision {
        debug!(event = event.name(), "transport event");
        match event {
            TransportEvent::Connection(update) => {
                let opened = update.connection == Some(ConnectionStatus::Open);
                let decision = self.supervisor.handle_update(&update, Instant::now());
                if opened && self.settings.greet_self_on_open {
                    self.greet_self(transport);
                }
                decision
            }
            TransportEvent::Messages(batch) => {
                for message in batch {
                    let queued = work.send(Work::Message {
                        transport: Arc::clone(&transport),
                        message,
                    });
                    if queued.is_err() {
                        warn!("message worker stopped, dropping message");
                    }
                }
                SupervisorDecision::Continue
            }
            TransportEvent::CredsUpdate(creds) => {
                if let Err(e) = self.auth.save_creds(&creds).await {
                    error!(error = %e, "failed to persist credentials");
                }
                SupervisorDecision::Continue
            }
            TransportEvent::KeysUpdate(updates) => {
                if let Err(e) = self.auth.apply_key_updates(&updates).await {
                    error!(error = %e, count = updates.len(), "failed to persist signal keys");
                }
                SupervisorDecision::Continue
            }
            TransportEvent::GroupParticipants(update) => {
                if work.send(Work::Group { transport, update }).is_err() {
                    warn!("message worker stopped, dropping group update");
                }
                SupervisorDecision::Continue
            }
        }
    }

    fn greet_self(&self, transport: Arc<dyn Transport>) {
        let Some(own_id) = transport.self_id() else {
            warn!("could not determine own WhatsApp id for self greeting");
            return;
        };
        let chat_id = format!("{}{USER_SUFFIX}", jid::number_from_jid(&own_id));
        let text = self_greeting(Utc::now().with_timezone(&self.settings.timezone));
        tokio::spawn(async move {
            if let Err(e) = transport
                .send_message(&chat_id, OutboundContent::text(text), SendOptions::default())
                .await
            {
                error!(error = %e, "failed to send self greeting");
            }
        });
    }
}

async fn next_event(active: &mut Option<Session>) -> Option<TransportEvent> {
    match active {
        Some(session) => session.events.recv().await,
        None => std::future::pending().await,
    }
}
