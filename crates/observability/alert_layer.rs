use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
    warn,
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use super::config::ServiceContext;

const ALERT_QUEUE_CAPACITY: usize = 128;
const SENSITIVE_MARKERS: [&str; 7] = [
    "token",
    "secret",
    "password",
    "authorization",
    "api_key",
    "email",
    "webhook",
];

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OpsAlert {
    pub(crate) service: String,
    pub(crate) environment: String,
    pub(crate) component: String,
    pub(crate) level: String,
    pub(crate) target: String,
    pub(crate) message: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    /// Names of the enclosing spans, outermost first.
    pub(crate) spans: Vec<String>,
    pub(crate) occurred_at: DateTime<Utc>,
}

#[async_trait]
pub(crate) trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &OpsAlert) -> anyhow::Result<()>;
}

/// Hands alerts to a background task so the logging call never waits on I/O.
#[derive(Clone)]
pub(crate) struct AlertDispatcher {
    tx: mpsc::Sender<OpsAlert>,
}

impl AlertDispatcher {
    pub(crate) fn spawn(sink: Arc<dyn AlertSink>) -> Self {
        let (tx, mut rx) = mpsc::channel::<OpsAlert>(ALERT_QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                if let Err(err) = sink.deliver(&alert).await {
                    warn!(error = %err, "observability: ops alert delivery failed");
                }
            }
        });

        Self { tx }
    }

    fn dispatch(&self, alert: OpsAlert) {
        if let Err(err) = self.tx.try_send(alert) {
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "full",
                mpsc::error::TrySendError::Closed(_) => "closed",
            };
            warn!(reason, "observability: ops alert queue unavailable; alert dropped");
        }
    }
}

pub(crate) struct OpsAlertLayer {
    dispatcher: AlertDispatcher,
    service: ServiceContext,
}

impl OpsAlertLayer {
    pub(crate) fn new(dispatcher: AlertDispatcher, service: ServiceContext) -> Self {
        Self {
            dispatcher,
            service,
        }
    }

    fn build_alert(
        &self,
        level: &tracing::Level,
        target: &str,
        mut fields: BTreeMap<String, String>,
        spans: Vec<String>,
    ) -> OpsAlert {
        let message = fields.remove("message").map(|raw| unquote(&raw));
        OpsAlert {
            service: self.service.service_name.clone(),
            environment: self.service.environment.clone(),
            component: self.service.component.clone(),
            level: level.as_str().to_string(),
            target: target.to_string(),
            message,
            fields,
            spans,
            occurred_at: Utc::now(),
        }
    }
}

impl<S> Layer<S> for OpsAlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // Delivery warnings come from this module and must not re-enter the queue.
        if event.metadata().target().starts_with(module_path!()) {
            return;
        }

        let mut visitor = RedactingVisitor::default();
        event.record(&mut visitor);

        let spans = ctx
            .event_span(event)
            .map(|span| {
                span.scope()
                    .from_root()
                    .map(|s| s.metadata().name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let metadata = event.metadata();
        let alert = self.build_alert(metadata.level(), metadata.target(), visitor.fields, spans);
        self.dispatcher.dispatch(alert);
    }
}

#[derive(Default)]
struct RedactingVisitor {
    fields: BTreeMap<String, String>,
}

impl RedactingVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        let name = field.name();
        let value = if is_sensitive(name) {
            "[REDACTED]".to_string()
        } else {
            value
        };
        self.fields.insert(name.to_string(), value);
    }
}

impl Visit for RedactingVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }
}

fn is_sensitive(field_name: &str) -> bool {
    let name = field_name.to_ascii_lowercase();
    SENSITIVE_MARKERS.iter().any(|marker| name.contains(marker))
}

fn unquote(raw: &str) -> String {
    raw.trim()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw.trim())
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        alerts: Mutex<Vec<OpsAlert>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn deliver(&self, alert: &OpsAlert) -> anyhow::Result<()> {
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    fn service() -> ServiceContext {
        ServiceContext {
            service_name: "harita-backend".to_string(),
            environment: "test".to_string(),
            component: "backend".to_string(),
        }
    }

    #[test]
    fn sensitive_field_names_are_matched_case_insensitively() {
        assert!(is_sensitive("refresh_token"));
        assert!(is_sensitive("OPENAI_API_KEY"));
        assert!(is_sensitive("user_email"));
        assert!(is_sensitive("Authorization"));
        assert!(!is_sensitive("user_id"));
        assert!(!is_sensitive("broadcast_id"));
    }

    #[test]
    fn unquote_strips_debug_quotes_only() {
        assert_eq!(unquote("\"sync failed\""), "sync failed");
        assert_eq!(unquote("plain"), "plain");
    }

    #[tokio::test]
    async fn error_events_are_redacted_and_delivered() {
        let sink = Arc::new(RecordingSink::default());
        let layer = OpsAlertLayer::new(AlertDispatcher::spawn(sink.clone()), service());
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("live_sync");
            let _guard = span.enter();
            tracing::error!(user_id = "u-1", email = "a@b.c", "entitlements: lookup failed");
        });

        for _ in 0..50 {
            if !sink.alerts.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }

        let alerts = sink.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.level, "ERROR");
        assert_eq!(alert.message.as_deref(), Some("entitlements: lookup failed"));
        assert_eq!(alert.fields.get("email").map(String::as_str), Some("[REDACTED]"));
        assert_eq!(alert.fields.get("user_id").map(String::as_str), Some("u-1"));
        assert_eq!(alert.spans, vec!["live_sync".to_string()]);
    }
}
