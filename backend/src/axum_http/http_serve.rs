use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use harita::{
    domain::policies::entitlement_overrides::StaticOverridePolicy,
    infra::db::postgres::postgres_connection::PgPoolSquad,
    openai::openai_client::OpenAiClient,
    youtube::youtube_client::{YoutubeClient, YoutubeConfig},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(
    config: Arc<DotEnvyConfig>,
    db_pool: Arc<PgPoolSquad>,
    override_policy: Arc<StaticOverridePolicy>,
) -> Result<()> {
    let youtube = Arc::new(YoutubeClient::new(YoutubeConfig::from(&config.youtube))?);
    let openai = Arc::new(OpenAiClient::new(
        config.openai.api_key.clone(),
        config.openai.model.clone(),
        config.openai.base_url.clone(),
    )?);

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/entitlements",
            routers::entitlements::routes(Arc::clone(&db_pool), Arc::clone(&override_policy)),
        )
        .nest(
            "/api/v1/subscriptions",
            routers::subscriptions::routes(Arc::clone(&db_pool), Arc::clone(&override_policy)),
        )
        .nest(
            "/api/v1/sessions",
            routers::sessions::routes(Arc::clone(&db_pool)),
        )
        .nest(
            "/api/v1/assistant",
            routers::assistant::routes(Arc::clone(&db_pool), openai),
        )
        .nest(
            "/api/v1/live-sessions",
            routers::live_sessions::routes(
                Arc::clone(&db_pool),
                youtube,
                Arc::clone(&override_policy),
            ),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = ?err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = ?err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
