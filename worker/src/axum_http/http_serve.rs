use crate::{axum_http::default_routers, config::config_model::DotEnvyConfig};
use anyhow::Result;
use axum::{Router, routing::get};
use backend::axum_http::http_serve::shutdown_signal;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Liveness endpoint for the container platform; the worker has no API.
pub async fn start(config: Arc<DotEnvyConfig>) -> Result<()> {
    let app = Router::new()
        .fallback(default_routers::not_found)
        .route("/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.worker_server.timeout,
        )))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.worker_server.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Worker HTTP server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
