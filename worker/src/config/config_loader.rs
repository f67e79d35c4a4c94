use super::config_model::{Database, DotEnvyConfig, LiveSync, WorkerServer};
use anyhow::{Context, Result, bail};
use backend::config::config_loader::load_youtube;

const DEFAULT_LIVE_SYNC_INTERVAL_SECONDS: u64 = 60;
const DEFAULT_SERVER_TIMEOUT_SECONDS: u64 = 30;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: std::env::var("SERVER_PORT_WORKER")
            .context("SERVER_PORT_WORKER is invalid")?
            .parse()
            .context("SERVER_PORT_WORKER is invalid")?,
        timeout: parse_or("SERVER_TIMEOUT", DEFAULT_SERVER_TIMEOUT_SECONDS)?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
    };

    let interval_seconds =
        parse_or("LIVE_SYNC_INTERVAL_SECONDS", DEFAULT_LIVE_SYNC_INTERVAL_SECONDS)?;
    if interval_seconds == 0 {
        bail!("LIVE_SYNC_INTERVAL_SECONDS must be greater than zero");
    }

    Ok(DotEnvyConfig {
        worker_server,
        database,
        youtube: load_youtube()?,
        live_sync: LiveSync { interval_seconds },
    })
}

fn parse_or(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("{key} is invalid")),
        _ => Ok(default),
    }
}
