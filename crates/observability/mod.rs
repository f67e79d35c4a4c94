mod alert_layer;
mod config;
mod webhook;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use alert_layer::{AlertDispatcher, OpsAlertLayer};
use config::ObservabilityConfig;
use webhook::WebhookAlertSink;

/// Installs the global subscriber: env-filtered local-time fmt output plus an
/// optional ops-alert webhook for events at or above `OPS_ALERT_LEVEL`.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let alert_layer = match config.alerts.as_ref() {
        Some(alerts) => {
            let sink = WebhookAlertSink::new(alerts.webhook_url.clone())?;
            let dispatcher = AlertDispatcher::spawn(Arc::new(sink));
            Some(
                OpsAlertLayer::new(dispatcher, config.service.clone())
                    .with_filter(LevelFilter::from_level(alerts.min_level)),
            )
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config.warnings {
        warn!(
            service = %config.service.service_name,
            component = %config.service.component,
            warning = %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %config.service.service_name,
        environment = %config.service.environment,
        component = %config.service.component,
        ops_alerts = config.alerts.is_some(),
        "observability: initialized"
    );

    Ok(())
}
