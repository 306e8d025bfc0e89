//! Statement API client
//!
//! Two read-only GETs per role:
//! - `{base}/ClientStatement/statement?key=..&hash=..`
//! - `{base}/ClientStatement/transactions?key=..&hash=..`
//!
//! and the same under `SupplierStatement/` for suppliers. Bodies are handed
//! back as raw JSON; the normalizer deals with their shape.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::{AccountRole, CompositeKey};
use crate::ports::StatementTransport;

/// Default API root, used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "https://localhost:7293/api/";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path segment for a role's controller
fn controller(role: AccountRole) -> &'static str {
    match role {
        AccountRole::Client => "ClientStatement",
        AccountRole::Supplier => "SupplierStatement",
    }
}

/// Parse a base URL, making sure relative joins land under it
pub fn parse_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(Error::Config("API base URL cannot be empty".to_string()));
    }
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|e| Error::Config(format!("invalid API base URL '{}': {}", trimmed, e)))
}

/// HTTP statement transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for one resource of a role, with the key and hash attached
    fn endpoint(&self, role: AccountRole, resource: &str, key: &CompositeKey) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("{}/{}", controller(role), resource))
            .map_err(|e| Error::Config(format!("invalid endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("key", key.account_key())
            .append_pair("hash", key.access_hash());
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<JsonValue> {
        debug!(path = url.path(), "GET");

        let response = self.client.get(url).send().await.map_err(map_request_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_request_error)?;

        if !status.is_success() {
            return Err(Error::server(status.as_u16(), server_message(&body)));
        }

        if body.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| Error::normalization(format!("response is not valid JSON: {}", e)))
    }
}

/// Only failures where no answer came back are transient. Redirect, body and
/// decode errors happen after the server replied and are reported as such.
fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::TransportAbort("request timed out".to_string())
    } else if error.is_connect() {
        Error::TransportAbort("unable to connect to the statement API".to_string())
    } else if error.is_request() {
        Error::TransportAbort(format!("request failed: {}", error))
    } else {
        warn!(error = %error, "statement API answered but the response was unusable");
        Error::server(error.status().map_or(0, |s| s.as_u16()), None)
    }
}

/// `message` or `Message` from a JSON error body; a short plain-text body is
/// taken as is
fn server_message(body: &str) -> Option<String> {
    match serde_json::from_str::<JsonValue>(body) {
        Ok(JsonValue::Object(obj)) => ["message", "Message", "title", "error"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(JsonValue::as_str))
            .map(str::to_string),
        Ok(JsonValue::String(s)) => Some(s),
        Ok(_) => None,
        Err(_) => {
            let text = body.trim();
            (!text.is_empty() && text.len() <= 200 && !text.starts_with('<')).then(|| text.to_string())
        }
    }
}

#[async_trait]
impl StatementTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_statement(&self, key: &CompositeKey, role: AccountRole) -> Result<JsonValue> {
        let url = self.endpoint(role, "statement", key)?;
        self.get_json(url).await
    }

    async fn fetch_transactions(&self, key: &CompositeKey, role: AccountRole) -> Result<JsonValue> {
        let url = self.endpoint(role, "transactions", key)?;
        self.get_json(url).await
    }
}
