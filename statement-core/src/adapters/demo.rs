//! Demo statement transport
//!
//! Serves a fixed client and supplier statement without any network access,
//! for when a link arrives without its key or hash. Payloads use the same
//! loose shapes as the live API so they pass through the normal pipeline.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::domain::result::Result;
use crate::domain::{AccountRole, CompositeKey};
use crate::ports::StatementTransport;

/// Key used for demo sessions
pub const DEMO_ACCOUNT_KEY: &str = "demo";

/// Hash used for demo sessions
pub const DEMO_ACCESS_HASH: &str = "demo";

/// Demo statement header for a role
pub fn demo_statement(role: AccountRole) -> JsonValue {
    match role {
        AccountRole::Client => json!({
            "clientName": "Demo Client",
            "accountNumber": "EG1234567890",
            "balance": 15234.75
        }),
        AccountRole::Supplier => json!({
            "supplierName": "Demo Supplier",
            "vatNumber": "EG-VAT-555-222",
            "balance": 9320.1
        }),
    }
}

/// Demo transaction list for a role
pub fn demo_transactions(role: AccountRole) -> JsonValue {
    match role {
        AccountRole::Client => json!([
            { "type": "Deposit", "amount": 5000, "currency": "EGP", "date": "2024-12-01", "notes": "Initial", "status": "Completed" },
            { "type": "Purchase", "amount": -1200.5, "currency": "EGP", "date": "2024-12-05", "notes": "Order #A102", "status": "Completed" },
            { "type": "Refund", "amount": 300, "currency": "EGP", "date": "2024-12-08", "notes": "Order #A102", "status": "Completed" }
        ]),
        AccountRole::Supplier => json!([
            { "type": "Invoice", "amount": 2500, "currency": "EGP", "date": "2024-12-02", "notes": "INV-101", "status": "Open" },
            { "type": "Payment", "amount": -1000, "currency": "EGP", "date": "2024-12-06", "notes": "Bank Transfer", "status": "Completed" }
        ]),
    }
}

/// Transport returning the demo statements for any key
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoTransport;

impl DemoTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StatementTransport for DemoTransport {
    fn name(&self) -> &str {
        "demo"
    }

    async fn fetch_statement(&self, _key: &CompositeKey, role: AccountRole) -> Result<JsonValue> {
        Ok(demo_statement(role))
    }

    async fn fetch_transactions(&self, _key: &CompositeKey, role: AccountRole) -> Result<JsonValue> {
        Ok(demo_transactions(role))
    }
}
