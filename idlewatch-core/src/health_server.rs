//! Small HTTP endpoint for hosting platforms that expect the process to
//! answer on `$PORT`, plus a JSON status route.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::monitor::InactivityMonitor;
use crate::Error;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub monitoring_enabled: bool,
    pub timer_active: bool,
    pub registered_users: usize,
    pub poll_interval_secs: u64,
    pub inactivity_threshold_secs: u64,
}

pub fn router(monitor: Arc<InactivityMonitor>) -> Router {
    Router::new()
        .route("/", get(|| async { "idlewatch is running" }))
        .route("/health", get(handle_health))
        .with_state(monitor)
}

async fn handle_health(State(monitor): State<Arc<InactivityMonitor>>) -> Json<HealthStatus> {
    let state = monitor.state();
    Json(HealthStatus {
        monitoring_enabled: state.enabled,
        timer_active: state.timer_active,
        registered_users: monitor.registry().len().await,
        poll_interval_secs: state.poll_interval.as_secs(),
        inactivity_threshold_secs: state.inactivity_threshold.as_secs(),
    })
}

/// Binds `0.0.0.0:port` and serves until the returned sender fires or is dropped.
pub async fn start_health_server(
    port: u16,
    monitor: Arc<InactivityMonitor>,
) -> Result<(JoinHandle<()>, oneshot::Sender<()>), Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", addr);

    let (shutdown_send, shutdown_recv) = oneshot::channel::<()>();
    let app = router(monitor);

    let handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_recv.await;
        });
        if let Err(e) = server.await {
            error!("HTTP server error: {}", e);
        }
        info!("HTTP server shut down.");
    });

    Ok((handle, shutdown_send))
}
