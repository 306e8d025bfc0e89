//! Normalized statement: profile plus ledger

use serde::{Deserialize, Serialize};

use super::{AccountProfile, AccountRole, StatementEntry};

/// What one successful load produces and what the cache holds per key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub role: AccountRole,
    pub profile: AccountProfile,
    pub entries: Vec<StatementEntry>,
}

impl Statement {
    pub fn new(role: AccountRole, profile: AccountProfile, entries: Vec<StatementEntry>) -> Self {
        Self {
            role,
            profile,
            entries,
        }
    }
}
