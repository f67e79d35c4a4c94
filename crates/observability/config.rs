use std::env;

use tracing::Level;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Debug, Clone)]
pub(crate) struct AlertConfig {
    pub(crate) webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service: ServiceContext,
    pub(crate) alerts: Option<AlertConfig>,
    /// Logged once the subscriber is installed.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(component: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let component = component.trim().to_string();

        let service = ServiceContext {
            service_name: get("SERVICE_NAME").unwrap_or_else(|| format!("harita-{component}")),
            environment: get("STAGE").unwrap_or_else(|| "local".to_string()),
            component,
        };

        let mut warnings = Vec::new();
        let enabled = get("OPS_ALERT_ENABLED").map(|raw| parse_bool(&raw));
        if enabled == Some(None) {
            warnings.push("OPS_ALERT_ENABLED is not a boolean; treating as enabled".to_string());
        }
        let enabled = enabled.flatten().unwrap_or(true);

        let alerts = if enabled {
            alerts_from(&get, &mut warnings)
        } else {
            None
        };

        Self {
            service,
            alerts,
            warnings,
        }
    }
}

fn alerts_from<G>(get: &G, warnings: &mut Vec<String>) -> Option<AlertConfig>
where
    G: Fn(&str) -> Option<String>,
{
    let raw_url = get("OPS_ALERT_WEBHOOK_URL")?;
    let webhook_url = match Url::parse(&raw_url) {
        Ok(url) => url,
        Err(err) => {
            // The URL carries a secret, so only the parse error is reported.
            warnings.push(format!(
                "OPS_ALERT_WEBHOOK_URL is invalid; ops alerts disabled ({err})"
            ));
            return None;
        }
    };

    let min_level = match get("OPS_ALERT_LEVEL") {
        Some(raw) => parse_level(&raw).unwrap_or_else(|| {
            warnings.push(format!("OPS_ALERT_LEVEL `{raw}` is unknown; using error"));
            Level::ERROR
        }),
        None => Level::ERROR,
    };

    Some(AlertConfig {
        webhook_url,
        min_level,
    })
}

fn parse_level(input: &str) -> Option<Level> {
    match input.to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        _ => None,
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    match input.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_with(vars: &[(&str, &str)]) -> ObservabilityConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ObservabilityConfig::from_lookup("backend", move |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_webhook() {
        let config = config_with(&[]);
        assert_eq!(config.service.service_name, "harita-backend");
        assert_eq!(config.service.environment, "local");
        assert!(config.alerts.is_none());
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn webhook_enables_alerts_at_error_by_default() {
        let config = config_with(&[("OPS_ALERT_WEBHOOK_URL", "https://hooks.example.com/abc")]);
        let alerts = config.alerts.unwrap();
        assert_eq!(alerts.min_level, Level::ERROR);
    }

    #[test]
    fn disabled_flag_wins_over_webhook() {
        let config = config_with(&[
            ("OPS_ALERT_ENABLED", "false"),
            ("OPS_ALERT_WEBHOOK_URL", "https://hooks.example.com/abc"),
        ]);
        assert!(config.alerts.is_none());
    }

    #[test]
    fn invalid_inputs_become_warnings() {
        let config = config_with(&[
            ("OPS_ALERT_WEBHOOK_URL", "https://hooks.example.com/abc"),
            ("OPS_ALERT_LEVEL", "loud"),
        ]);
        assert_eq!(config.alerts.unwrap().min_level, Level::ERROR);
        assert_eq!(config.warnings.len(), 1);

        let config = config_with(&[("OPS_ALERT_WEBHOOK_URL", "not a url")]);
        assert!(config.alerts.is_none());
        assert!(!config.warnings[0].contains("not a url"));
    }
}
