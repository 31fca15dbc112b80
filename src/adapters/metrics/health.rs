//! Health Check Server - Liveness and Readiness Probes
//!
//! Exposes /live and /ready endpoints via axum 0.7 for Docker
//! health checks and monitoring. Readiness follows the engine
//! lifecycle: ready in every state except `Stopped`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::usecases::run_controller::EngineState;

/// Axum-based health check HTTP server.
///
/// Serves liveness (/live) and readiness (/ready) endpoints for
/// Docker health checks and orchestrator probes.
pub struct HealthServer {
    /// Engine lifecycle feed from the run controller.
    state: watch::Receiver<EngineState>,
    /// Bind port (default 8080 from config).
    port: u16,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(state: watch::Receiver<EngineState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Build the probe router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .with_state(self.state.clone())
    }

    /// Start the health check server in the background.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = self.router();

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: 200 unless the engine has stopped.
    async fn readiness(State(state): State<watch::Receiver<EngineState>>) -> impl IntoResponse {
        if is_ready(*state.borrow()) {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}

fn is_ready(state: EngineState) -> bool {
    state != EngineState::Stopped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_until_stopped() {
        assert!(is_ready(EngineState::Idle));
        assert!(is_ready(EngineState::Distributing));
        assert!(!is_ready(EngineState::Stopped));
    }

    #[tokio::test]
    async fn test_readiness_tracks_watch_channel() {
        let (tx, rx) = watch::channel(EngineState::Idle);
        let response = HealthServer::readiness(State(rx.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        tx.send_replace(EngineState::Stopped);
        let response = HealthServer::readiness(State(rx)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
