//! Composite cache key

use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// The (account key, access hash) pair identifying one statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    account_key: String,
    access_hash: String,
}

impl CompositeKey {
    /// Build a key; both parts must be non-empty
    pub fn new(account_key: impl Into<String>, access_hash: impl Into<String>) -> Result<Self> {
        let account_key = account_key.into().trim().to_string();
        let access_hash = access_hash.into().trim().to_string();
        if account_key.is_empty() {
            return Err(Error::validation("account key cannot be empty"));
        }
        if access_hash.is_empty() {
            return Err(Error::validation("access hash cannot be empty"));
        }
        Ok(Self {
            account_key,
            access_hash,
        })
    }

    pub fn account_key(&self) -> &str {
        &self.account_key
    }

    pub fn access_hash(&self) -> &str {
        &self.access_hash
    }
}

// The hash is an access credential and stays out of log lines.
impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.account_key)
    }
}
