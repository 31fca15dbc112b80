//! Gift Auto-purchase Bot - Entry Point
//!
//! Initializes configuration, logging, stores, and the Bot API client,
//! then runs the poll loop until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Read the bot token from the configured env var
//! 4. Open the ledger journal and settings snapshot
//! 5. Create BotApiClient (HTTP + rate limit) and its port adapters
//! 6. Spawn health server (/live + /ready) and metrics server (/metrics)
//! 7. Start the RunController poll loop
//! 8. Wait for SIGINT -> stop after the in-flight pass -> exit

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use gift_autobuy_bot::adapters::api::{BotApiClient, TelegramGifts, TelegramNotifier};
use gift_autobuy_bot::adapters::metrics::{HealthServer, MetricsRegistry};
use gift_autobuy_bot::adapters::persistence::{JsonSettingsStore, JsonlLedger};
use gift_autobuy_bot::config;
use gift_autobuy_bot::ports::ledger::LedgerStore;
use gift_autobuy_bot::usecases::{Distributor, RunController};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.bot.dry_run,
        data_dir = %config.persistence.data_dir,
        "Starting gift auto-purchase bot"
    );

    if config.bot.dry_run {
        warn!("Dry-run mode: gifts are NOT sent, ledger is still settled");
    }

    // ── 3. Bot token from env ───────────────────────────────
    let token = std::env::var(&config.bot.bot_token_env)
        .with_context(|| format!("Environment variable {} not set", config.bot.bot_token_env))?;

    // ── 4. Stores ───────────────────────────────────────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);
    let ledger = Arc::new(
        JsonlLedger::open(&config.persistence.data_dir)
            .await
            .context("Failed to open ledger")?,
    );
    let settings = Arc::new(
        JsonSettingsStore::open(&config.persistence.data_dir, config.preferences)
            .await
            .context("Failed to open settings store")?,
    );

    match ledger.total_balance().await {
        Ok(total) => info!(total_balance = total, "Ledger ready"),
        Err(e) => warn!(error = %e, "Failed to compute total balance"),
    }

    // ── 5. Bot API client + adapters ────────────────────────
    let client = Arc::new(
        BotApiClient::new(&config.api, &token).context("Failed to create Bot API client")?,
    );
    let gifts = Arc::new(TelegramGifts::new(
        Arc::clone(&client),
        config.bot.dry_run,
        config.bot.gift_text.clone(),
    ));
    let notifier = Arc::new(TelegramNotifier::new(client));

    let distributor = Distributor::new(
        Arc::clone(&gifts),
        Arc::clone(&ledger),
        notifier,
        &config.engine,
        Arc::clone(&metrics),
    );
    let controller = Arc::new(RunController::new(
        gifts,
        settings,
        distributor,
        &config.engine,
        config.preferences,
        Arc::clone(&metrics),
    ));

    // ── 6. Health + metrics servers ─────────────────────────
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let health = HealthServer::new(controller.subscribe_state(), config.metrics.health_port);
    let health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    let metrics_handle = if config.metrics.enabled {
        let metrics_shutdown = shutdown_tx.subscribe();
        let bind_address = config.metrics.bind_address.clone();
        let registry = Arc::clone(&metrics);
        Some(tokio::spawn(async move {
            if let Err(e) = registry.serve(bind_address, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }))
    } else {
        None
    };

    // ── 7. Poll loop ────────────────────────────────────────
    let mut engine_handle = Arc::clone(&controller).start();
    info!("All tasks spawned, bot is running");

    // ── 8. Graceful shutdown ────────────────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, finishing in-flight pass");
            controller.stop();
            tokio::select! {
                result = &mut engine_handle => {
                    if let Err(e) = result {
                        error!(error = %e, "Engine task failed");
                    }
                }
                _ = signal::ctrl_c() => {
                    warn!("Second SIGINT, aborting in-flight pass");
                    engine_handle.abort();
                }
            }
        }
        result = &mut engine_handle => {
            if let Err(e) = result {
                error!(error = %e, "Engine task failed");
            }
        }
    }

    let _ = shutdown_tx.send(());
    let _ = health_handle.await;
    if let Some(handle) = metrics_handle {
        let _ = handle.await;
    }

    info!("Shutdown complete");
    Ok(())
}
