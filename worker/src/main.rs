use anyhow::Result;
use backend::usecases::live_sync::LiveSyncUseCase;
use harita::{
    infra::db::{
        postgres::postgres_connection,
        repositories::{live_sessions::LiveSessionPostgres, recordings::RecordingPostgres},
    },
    youtube::youtube_client::{YoutubeClient, YoutubeConfig},
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};
use worker::{axum_http, background_worker::live_sync_worker, config};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    harita::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let youtube = Arc::new(YoutubeClient::new(YoutubeConfig::from(&dotenvy_env.youtube))?);
    info!(oauth = youtube.has_oauth(), "live_sync: YouTube client ready");

    let live_sync_usecase = Arc::new(LiveSyncUseCase::new(
        Arc::new(LiveSessionPostgres::new(Arc::clone(&db_pool_arc))),
        Arc::new(RecordingPostgres::new(Arc::clone(&db_pool_arc))),
        youtube,
    ));

    let live_sync_loop = tokio::spawn(live_sync_worker::run(
        live_sync_usecase,
        Duration::from_secs(dotenvy_env.live_sync.interval_seconds),
    ));

    let health_server = tokio::spawn(axum_http::http_serve::start(Arc::clone(&dotenvy_env)));

    tokio::select! {
        result = live_sync_loop => result??,
        result = health_server => result??,
    };
    Ok(())
}
