//! Analytics port
//!
//! Fire-and-forget visitor events. Nothing an implementation does may fail
//! or slow down the data pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AccountRole, CompositeKey};

/// Event type emitted the first time a statement is opened
pub const PAGE_LINK_EVENT: &str = "Page_Link";

/// Event type emitted when the user follows an outbound link
pub const LINK_CLICK_EVENT: &str = "Link_Click";

/// A visitor event, serialized in the backend's field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_type: String,
    #[serde(rename = "companyKey", skip_serializing_if = "Option::is_none")]
    pub account_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(rename = "accountType", skip_serializing_if = "Option::is_none")]
    pub account_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub event_date: DateTime<Utc>,
    pub user_agent: String,
}

impl AnalyticsEvent {
    /// Create a new event with just an event type
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            account_key: None,
            account_name: None,
            account_role: None,
            url: None,
            event_date: Utc::now(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// The one-time event for a statement's first successful load
    pub fn page_link(key: &CompositeKey, account_name: &str, role: AccountRole) -> Self {
        Self::new(PAGE_LINK_EVENT)
            .with_account_key(key.account_key())
            .with_account_name(account_name)
            .with_role(role)
    }

    /// Set the account key context
    pub fn with_account_key(mut self, key: impl Into<String>) -> Self {
        self.account_key = Some(key.into());
        self
    }

    /// Set the account name context
    pub fn with_account_name(mut self, name: impl Into<String>) -> Self {
        self.account_name = Some(name.into());
        self
    }

    /// Set the account role context
    pub fn with_role(mut self, role: AccountRole) -> Self {
        self.account_role = Some(role.label().to_string());
        self
    }

    /// Set the followed link
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Analytics collaborator
pub trait AnalyticsSink: Send + Sync {
    /// Hand the event off. Must not block and must swallow its own failures.
    fn emit(&self, event: AnalyticsEvent);
}
