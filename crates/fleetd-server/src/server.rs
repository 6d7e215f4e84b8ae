//! `FleetServer` — the Axum HTTP + WebSocket surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::Json;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use fleetd_core::{DeviceEvent, DeviceStore};
use fleetd_ingest::LogQueue;

use crate::config::ServerConfig;
use crate::handlers;
use crate::health::{self, HealthResponse};
use crate::shutdown::Shutdown;
use crate::ws;
use crate::ws::hub::DeviceEventHub;

/// Collaborators the server is wired with at startup.
pub struct ServiceContext {
    /// Device lookup and update contract.
    pub store: Arc<dyn DeviceStore>,
    /// The segment-log ingestion queue.
    pub queue: Arc<LogQueue>,
    /// The live device event hub.
    pub hub: Arc<DeviceEventHub>,
    /// Producer side of the application event source.
    pub events_tx: mpsc::Sender<DeviceEvent>,
    /// Directory uploaded segments are written under.
    pub data_dir: PathBuf,
}

/// Shared state accessible from the Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Device lookup and update contract.
    pub store: Arc<dyn DeviceStore>,
    /// The segment-log ingestion queue.
    pub queue: Arc<LogQueue>,
    /// The live device event hub.
    pub hub: Arc<DeviceEventHub>,
    /// Producer side of the application event source.
    pub events_tx: mpsc::Sender<DeviceEvent>,
    /// Directory uploaded segments are written under.
    pub data_dir: PathBuf,
    /// Shutdown coordinator.
    pub shutdown: Arc<Shutdown>,
    /// Prometheus render handle for `/metrics`.
    pub metrics: PrometheusHandle,
    /// When the server started.
    pub start_time: Instant,
}

/// The fleetd server.
pub struct FleetServer {
    config: ServerConfig,
    state: AppState,
}

impl FleetServer {
    /// Wire up a server from its collaborators.
    pub fn new(config: ServerConfig, ctx: ServiceContext, metrics: PrometheusHandle) -> Self {
        let state = AppState {
            store: ctx.store,
            queue: ctx.queue,
            hub: ctx.hub,
            events_tx: ctx.events_tx,
            data_dir: ctx.data_dir,
            shutdown: Arc::new(Shutdown::new()),
            metrics,
            start_time: Instant::now(),
        };
        Self { config, state }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route(
                "/v1/devices/{serial}/logs/{segment}",
                put(handlers::upload_log),
            )
            .route("/v1/devices/{serial}/events", get(ws::handler::device_events))
            .route("/v1/admin/events/test", post(handlers::publish_test_event))
            .layer(DefaultBodyLimit::max(self.config.max_message_size))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind and serve. Returns the bound address and the serve task, which
    /// exits after the shutdown coordinator fires.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "listening");

        let app = self.router();
        let token = self.state.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(err) = serve.await {
                tracing::error!(error = %err, "server exited with error");
            }
        });
        Ok((addr, handle))
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<Shutdown> {
        &self.state.shutdown
    }

    /// The live event hub.
    pub fn hub(&self) -> &Arc<DeviceEventHub> {
        &self.state.hub
    }
}

/// GET `/health`
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.hub.connected_count(),
    ))
}

/// GET `/metrics`
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}
