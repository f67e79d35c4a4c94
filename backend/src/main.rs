use anyhow::Result;
use backend::axum_http::http_serve;
use backend::config::{config_loader, config_model::Entitlements};
use chrono::Duration;
use harita::{
    domain::policies::entitlement_overrides::StaticOverridePolicy,
    infra::db::postgres::postgres_connection,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    harita::observability::init_observability("backend")?;

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let override_policy = load_override_policy(&dotenvy_env.entitlements);
    info!(
        grandfathered = override_policy.grandfathered_count(),
        super_admin = dotenvy_env.entitlements.super_admin_email.is_some(),
        validity_days = dotenvy_env.entitlements.override_days,
        "entitlements: override policy loaded"
    );

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    http_serve::start(
        Arc::new(dotenvy_env),
        Arc::new(postgres_pool),
        Arc::new(override_policy),
    )
    .await?;

    Ok(())
}

fn load_override_policy(entitlements: &Entitlements) -> StaticOverridePolicy {
    StaticOverridePolicy::new(
        entitlements.super_admin_email.as_deref(),
        &entitlements.override_emails,
        Duration::days(entitlements.override_days),
    )
}
