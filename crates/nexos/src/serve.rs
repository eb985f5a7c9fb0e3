// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nexos serve` command implementation.
//!
//! Opens SQLite storage, loads the command registry, connects the admin
//! relay, starts the health server, and runs the bot loop against the
//! WhatsApp bridge until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use nexos_agent::{BackoffPolicy, BotLoop, ConnectionSupervisor, GroupGreeter, LoopSettings, shutdown};
use nexos_commands::{CommandRegistry, builtin};
use nexos_config::NexosConfig;
use nexos_core::{AdminRelay, IgnoreStore, NexosError, PluginAdapter};
use nexos_gateway::{HealthState, MetricsRender, ServerConfig};
use nexos_router::{MessageRouter, RouterSettings};
use nexos_storage::SqliteStorage;
use nexos_whatsapp::BridgeSessionFactory;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[cfg(feature = "telegram")]
use nexos_telegram::TelegramRelay;

/// Runs the `nexos serve` command.
///
/// Supports graceful shutdown via signal handlers: the bot loop drains its
/// message queue, then the health server and adapters are stopped.
pub async fn run_serve(config: NexosConfig) -> Result<(), NexosError> {
    init_tracing(&config.bot.log_level);

    info!(name = %config.bot.name, "starting nexos serve");

    let prometheus = match nexos_prometheus::PrometheusAdapter::new() {
        Ok(adapter) => Some(adapter),
        Err(e) => {
            warn!(error = %e, "prometheus initialization failed, continuing without metrics");
            None
        }
    };

    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    info!(path = %config.storage.database_path, "storage ready");

    let registry = Arc::new(CommandRegistry::load(builtin::all(&config)?));
    info!(commands = registry.len(), "command registry loaded");

    let relay = admin_relay(&config).await?;

    let router = Arc::new(MessageRouter::new(
        registry,
        storage.clone() as Arc<dyn IgnoreStore>,
        RouterSettings::from_config(&config),
    ));
    if config.bot.admin_number.is_none() {
        debug!("no admin number configured, admin commands disabled");
    }

    let factory = Arc::new(BridgeSessionFactory::new(config.bridge.clone()));
    let supervisor = ConnectionSupervisor::new(BackoffPolicy::from_config(&config.reconnect), relay);
    let bot = BotLoop::new(
        factory.clone(),
        storage.clone(),
        supervisor,
        router,
        Arc::new(GroupGreeter::new(config.groups.clone())),
        LoopSettings::from_config(&config)?,
    );

    let cancel = shutdown::install_signal_handler();

    let mut health_state = HealthState::new(bot.subscribe());
    if let Some(adapter) = &prometheus {
        let handle = adapter.handle().clone();
        let render: MetricsRender = Arc::new(move || handle.render());
        health_state = health_state.with_metrics(render);
    }
    let health_config = ServerConfig::from(&config.health);
    let health_cancel = cancel.clone();
    let health = tokio::spawn(async move {
        if let Err(e) = nexos_gateway::start_server(&health_config, health_state, health_cancel).await {
            error!(error = %e, "health server failed");
        }
    });

    {
        let mem_cancel = cancel.clone();
        tokio::spawn(async move {
            memory_monitor(mem_cancel).await;
        });
        debug!("memory monitor started");
    }

    info!(bridge = %factory.url(), "connecting to WhatsApp bridge");
    let result = bot.run(cancel.clone()).await;

    // The loop also returns on error; make sure everything else stops too.
    cancel.cancel();
    if let Err(e) = factory.shutdown().await {
        warn!(error = %e, "bridge shutdown failed");
    }
    if let Err(e) = storage.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }
    let _ = health.await;

    result?;
    info!("nexos serve shutdown complete");
    Ok(())
}

#[cfg(feature = "telegram")]
async fn admin_relay(config: &NexosConfig) -> Result<Option<Arc<dyn AdminRelay>>, NexosError> {
    let Some(relay) = TelegramRelay::from_config(&config.telegram)? else {
        return Ok(None);
    };
    relay.announce_startup().await;
    info!(chat_id = relay.chat_id().0, "telegram admin relay enabled");
    Ok(Some(Arc::new(relay)))
}

#[cfg(not(feature = "telegram"))]
async fn admin_relay(config: &NexosConfig) -> Result<Option<Arc<dyn AdminRelay>>, NexosError> {
    if config.telegram.is_configured() {
        warn!("telegram configured but the telegram feature is not compiled in");
    }
    Ok(None)
}

/// Exports jemalloc heap and resident bytes as gauges every 5 seconds.
#[cfg(not(target_env = "msvc"))]
async fn memory_monitor(cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Stats are cached until the epoch advances.
                let _ = tikv_jemalloc_ctl::epoch::advance();
                let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
                let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
                nexos_prometheus::set_memory_heap(allocated as f64);
                nexos_prometheus::set_memory_resident(resident as f64);
            }
            _ = cancel.cancelled() => {
                debug!("memory monitor shutting down");
                break;
            }
        }
    }
}

/// Stub memory monitor for MSVC (no jemalloc).
#[cfg(target_env = "msvc")]
async fn memory_monitor(cancel: CancellationToken) {
    cancel.cancelled().await;
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

fn default_filter(log_level: &str) -> String {
    format!("nexos={log_level},warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_scopes_level_to_nexos() {
        assert_eq!(default_filter("debug"), "nexos=debug,warn");
    }

    #[tokio::test]
    async fn relay_disabled_without_telegram_settings() {
        let relay = admin_relay(&NexosConfig::default()).await.unwrap();
        assert!(relay.is_none());
    }
}
