//! Account profile domain model

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::Error;
use super::Timestamp;

/// Which side of the business the statement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Client,
    Supplier,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Client => "client",
            AccountRole::Supplier => "supplier",
        }
    }

    /// Capitalised form used by the backend
    pub fn label(&self) -> &'static str {
        match self {
            AccountRole::Client => "Client",
            AccountRole::Supplier => "Supplier",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(AccountRole::Client),
            "supplier" => Ok(AccountRole::Supplier),
            other => Err(Error::validation(format!("unknown account role: {}", other))),
        }
    }
}

/// The subject of a statement. Same shape for clients and suppliers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    pub external_url: Option<String>,

    // =========================================================================
    // Statement header details
    // =========================================================================
    /// Client account number or supplier VAT number
    pub account_number: Option<String>,
    pub currency: Option<String>,
    /// Balance as reported in the statement header, if parseable
    pub balance: Option<Decimal>,
    pub last_transaction_date: Option<Timestamp>,
    pub status: Option<String>,
    pub from_date: Option<Timestamp>,
    pub to_date: Option<Timestamp>,
}

impl AccountProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the account is flagged active by the backend
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("active"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Client".parse::<AccountRole>().unwrap(), AccountRole::Client);
        assert_eq!(" supplier ".parse::<AccountRole>().unwrap(), AccountRole::Supplier);
        assert!("vendor".parse::<AccountRole>().is_err());
        assert_eq!(AccountRole::Supplier.label(), "Supplier");
    }

    #[test]
    fn test_active_status() {
        let mut profile = AccountProfile::new("Demo Supplier");
        assert!(!profile.is_active());
        profile.status = Some("Active".to_string());
        assert!(profile.is_active());
    }
}
