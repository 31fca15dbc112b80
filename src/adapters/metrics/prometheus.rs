//! Prometheus Metrics Registry - Auto-purchase Observability
//!
//! Registers and exposes Prometheus metrics for Grafana dashboards.
//! Covers catalog polling, delivery attempts, and settled stars.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Centralized Prometheus metrics for the auto-purchase engine.
///
/// All metrics follow the naming convention `gift_bot_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Catalog polls by outcome (`ok`, `error`).
    pub catalog_polls: IntCounterVec,
    /// Distribution passes started.
    pub distribution_passes: IntCounter,
    /// Gifts confirmed delivered.
    pub gifts_delivered: IntCounter,
    /// Delivery attempts that failed and were retried.
    pub delivery_retries: IntCounter,
    /// Planned gifts that ended failed, by reason (`exhausted`, `rejected`).
    pub delivery_failures: IntCounterVec,
    /// Stars debited by settlement.
    pub stars_settled: IntCounter,
    /// Settlements clipped to the current balance.
    pub settlement_clips: IntCounter,
    /// Per-account passes aborted by a store failure.
    pub account_errors: IntCounter,
    /// 1 while a distribution pass is running.
    pub distributing: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let catalog_polls = IntCounterVec::new(
            Opts::new("gift_bot_catalog_polls_total", "Catalog polls by outcome"),
            &["outcome"],
        )?;

        let distribution_passes = IntCounter::new(
            "gift_bot_distribution_passes_total",
            "Distribution passes started",
        )?;

        let gifts_delivered = IntCounter::new(
            "gift_bot_gifts_delivered_total",
            "Gifts confirmed delivered",
        )?;

        let delivery_retries = IntCounter::new(
            "gift_bot_delivery_retries_total",
            "Failed delivery attempts that were retried",
        )?;

        let delivery_failures = IntCounterVec::new(
            Opts::new(
                "gift_bot_delivery_failures_total",
                "Planned gifts that could not be delivered",
            ),
            &["reason"],
        )?;

        let stars_settled = IntCounter::new(
            "gift_bot_stars_settled_total",
            "Stars debited for delivered gifts",
        )?;

        let settlement_clips = IntCounter::new(
            "gift_bot_settlement_clips_total",
            "Settlements clipped to the current balance",
        )?;

        let account_errors = IntCounter::new(
            "gift_bot_account_errors_total",
            "Per-account passes aborted by a store failure",
        )?;

        let distributing = IntGauge::new(
            "gift_bot_distributing",
            "Whether a distribution pass is running (1=yes, 0=no)",
        )?;

        // Register all metrics
        registry.register(Box::new(catalog_polls.clone()))?;
        registry.register(Box::new(distribution_passes.clone()))?;
        registry.register(Box::new(gifts_delivered.clone()))?;
        registry.register(Box::new(delivery_retries.clone()))?;
        registry.register(Box::new(delivery_failures.clone()))?;
        registry.register(Box::new(stars_settled.clone()))?;
        registry.register(Box::new(settlement_clips.clone()))?;
        registry.register(Box::new(account_errors.clone()))?;
        registry.register(Box::new(distributing.clone()))?;

        Ok(Self {
            registry,
            catalog_polls,
            distribution_passes,
            gifts_delivered,
            delivery_retries,
            delivery_failures,
            stars_settled,
            settlement_clips,
            account_errors,
            distributing,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
