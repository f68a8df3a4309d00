//! Sensor Feed Server
//!
//! A WebSocket server that streams simulated Bioharness frames to every
//! connected dashboard, standing in for the sensor collection server.
//!
//! # Endpoints
//!
//! - `GET /ws` - Sensor stream (WebSocket)
//! - `GET /health` - Liveness and connection count

mod simulator;

pub use simulator::{BioharnessSimulator, SUMMARY_SERIES};

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::FeedConfig;
use crate::error::Result;
use crate::websocket::{websocket_handler, ConnectionHub, HubConfig};

/// Shared state for feed handlers
pub struct FeedState {
    /// Connected dashboards
    pub hub: Arc<ConnectionHub>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl FeedState {
    pub fn new(hub_config: HubConfig) -> Self {
        Self {
            hub: Arc::new(ConnectionHub::new(hub_config)),
            start_time: Instant::now(),
        }
    }
}

/// Health response body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub uptime_secs: u64,
}

/// Build the feed router
pub fn build_router(state: Arc<FeedState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<FeedState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.hub.connection_count().await,
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Broadcast one simulated frame per `interval` until the task is aborted
pub fn start_simulation(hub: Arc<ConnectionHub>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut simulator = BioharnessSimulator::new();
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let frame = simulator.next_frame(interval, chrono::Utc::now().timestamp_millis());
            let receivers = hub.broadcast(&frame).await;
            tracing::trace!(receivers, "Simulated frame sent");
        }
    })
}

/// Run the feed server on an already bound listener until `shutdown` resolves
pub async fn run<F>(listener: TcpListener, config: &FeedConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(FeedState::new(HubConfig {
        max_connections: config.max_connections,
        ..Default::default()
    }));

    let interval = Duration::from_millis(config.interval_ms.max(1));
    let simulation = start_simulation(Arc::clone(&state.hub), interval);

    tracing::info!(
        addr = %listener.local_addr()?,
        interval_ms = config.interval_ms,
        "Sensor feed listening"
    );

    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await;

    simulation.abort();
    result?;

    tracing::info!("Sensor feed shut down gracefully");
    Ok(())
}

/// Bind the configured address and serve until Ctrl+C or SIGTERM
pub async fn serve(config: &FeedConfig) -> Result<()> {
    let listener = TcpListener::bind(config.addr()).await?;
    run(listener, config, shutdown_signal()).await
}

/// Wait for shutdown signal
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
