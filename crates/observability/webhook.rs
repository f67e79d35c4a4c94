use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use url::Url;

use super::alert_layer::{AlertSink, OpsAlert};

/// Posts alerts as JSON to a generic incoming webhook (Slack-compatible `text`
/// plus the structured alert).
pub(crate) struct WebhookAlertSink {
    url: Url,
    http: reqwest::Client,
}

impl WebhookAlertSink {
    pub(crate) fn new(url: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .context("failed to build ops alert http client")?;
        Ok(Self { url, http })
    }
}

pub(crate) fn summary_line(alert: &OpsAlert) -> String {
    let mut line = format!(
        "[{}] {}/{} ({}) {}",
        alert.level, alert.service, alert.component, alert.environment, alert.target
    );
    if let Some(message) = alert.message.as_deref().filter(|m| !m.is_empty()) {
        line.push_str(": ");
        line.push_str(message);
    }
    line
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn deliver(&self, alert: &OpsAlert) -> Result<()> {
        let payload = json!({
            "text": summary_line(alert),
            "alert": alert,
        });

        let resp = self
            .http
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            // reqwest errors embed the URL, which carries the webhook secret.
            .map_err(|err| {
                if err.is_timeout() {
                    anyhow!("ops alert webhook timed out")
                } else {
                    anyhow!("ops alert webhook request failed")
                }
            })?;

        if !resp.status().is_success() {
            return Err(anyhow!("ops alert webhook returned {}", resp.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;

    #[test]
    fn summary_includes_message_when_present() {
        let mut alert = OpsAlert {
            service: "harita-worker".to_string(),
            environment: "prod".to_string(),
            component: "worker".to_string(),
            level: "ERROR".to_string(),
            target: "worker::services::sync_loop".to_string(),
            message: Some("live_sync: stage failed".to_string()),
            fields: BTreeMap::new(),
            spans: Vec::new(),
            occurred_at: Utc::now(),
        };

        assert_eq!(
            summary_line(&alert),
            "[ERROR] harita-worker/worker (prod) worker::services::sync_loop: live_sync: stage failed"
        );

        alert.message = None;
        assert!(summary_line(&alert).ends_with("sync_loop"));
    }
}
