//! Analytics sinks
//!
//! - `HttpAnalytics` posts visitor events to the backend on a background task
//! - `TracingAnalytics` only records events in the diagnostic log
//! - `MemoryAnalytics` collects events for tests and offline runs

use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use url::Url;

use crate::adapters::http::parse_base_url;
use crate::domain::result::{Error, Result};
use crate::ports::{AnalyticsEvent, AnalyticsSink};

/// Visitor event endpoint, relative to the API root
pub const VISITOR_EVENT_PATH: &str = "VisitorEvent/log";

const ANALYTICS_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts events as JSON, fire-and-forget
///
/// Each event is sent from its own spawned task. Failures are logged and
/// dropped. Outside a tokio runtime events are logged and skipped.
#[derive(Debug, Clone)]
pub struct HttpAnalytics {
    client: Client,
    url: Url,
}

impl HttpAnalytics {
    /// Sink posting to an explicit event URL
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url.trim())
            .map_err(|e| Error::Config(format!("invalid analytics URL '{}': {}", url, e)))?;
        let client = Client::builder()
            .timeout(ANALYTICS_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, url })
    }

    /// Sink posting to `VisitorEvent/log` under the API root
    pub fn for_api(api_base_url: &str) -> Result<Self> {
        let url = parse_base_url(api_base_url)?
            .join(VISITOR_EVENT_PATH)
            .map_err(|e| Error::Config(format!("invalid analytics URL: {}", e)))?;
        Self::new(url.as_str())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl AnalyticsSink for HttpAnalytics {
    fn emit(&self, event: AnalyticsEvent) {
        let Ok(handle) = Handle::try_current() else {
            warn!(event_type = %event.event_type, "No async runtime, analytics event dropped");
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        handle.spawn(async move {
            let event_type = event.event_type.clone();
            match client.post(url).json(&event).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(event_type = %event_type, "analytics event delivered");
                }
                Ok(response) => {
                    warn!(event_type = %event_type, status = response.status().as_u16(), "Analytics endpoint rejected event");
                }
                Err(e) => {
                    warn!(event_type = %event_type, error = %e, "Failed to send analytics event");
                }
            }
        });
    }
}

/// Writes events to the diagnostic log only
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn emit(&self, event: AnalyticsEvent) {
        info!(
            event_type = %event.event_type,
            account_key = event.account_key.as_deref().unwrap_or("-"),
            account_role = event.account_role.as_deref().unwrap_or("-"),
            "analytics event"
        );
    }
}

/// Keeps every emitted event in memory
#[derive(Debug, Default)]
pub struct MemoryAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemoryAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events emitted so far
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events().iter().filter(|e| e.event_type == event_type).count()
    }
}

impl AnalyticsSink for MemoryAnalytics {
    fn emit(&self, event: AnalyticsEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
