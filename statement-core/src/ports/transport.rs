//! Statement transport port
//!
//! Defines the two read-only fetches issued per load. Implementations return
//! the raw JSON body untouched; shape handling belongs to the normalizer.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::domain::result::Result;
use crate::domain::{AccountRole, CompositeKey};

/// Outbound fetch collaborator
///
/// Errors must be classified: [`Error::TransportAbort`] when no response
/// reached the server, [`Error::Server`] when the server answered with a
/// failure.
///
/// [`Error::TransportAbort`]: crate::domain::result::Error::TransportAbort
/// [`Error::Server`]: crate::domain::result::Error::Server
#[async_trait]
pub trait StatementTransport: Send + Sync {
    /// Transport name (e.g., "http", "demo")
    fn name(&self) -> &str;

    /// Fetch the statement header (account profile)
    async fn fetch_statement(&self, key: &CompositeKey, role: AccountRole) -> Result<JsonValue>;

    /// Fetch the transaction list
    async fn fetch_transactions(&self, key: &CompositeKey, role: AccountRole) -> Result<JsonValue>;
}
