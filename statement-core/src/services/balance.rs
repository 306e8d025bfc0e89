//! Balance engine - current and running balances
//!
//! Pure functions over the complete, unfiltered entry set. Running balances
//! are attached once here and carried through every filtered or sorted view
//! unchanged.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;
use crate::domain::{Money, StatementEntry};

/// Which side computes per-entry balances
///
/// Chosen by configuration, agreed with the upstream service. Never inferred
/// from whether the payload happens to carry a balance field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceMode {
    /// Running balance is the prefix sum of credit minus debit
    #[default]
    #[serde(rename = "client")]
    ClientDerived,
    /// Each entry's `balance` comes from the backend and is authoritative
    #[serde(rename = "backend")]
    BackendAuthoritative,
}

impl BalanceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceMode::ClientDerived => "client",
            BalanceMode::BackendAuthoritative => "backend",
        }
    }
}

impl fmt::Display for BalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalanceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" | "client-derived" => Ok(BalanceMode::ClientDerived),
            "backend" | "backend-authoritative" => Ok(BalanceMode::BackendAuthoritative),
            other => Err(Error::validation(format!("unknown balance mode: {}", other))),
        }
    }
}

/// Entries in ledger order: valid dates ascending, equal dates in array
/// order, invalid dates last (also in array order)
pub fn chronological(entries: &[StatementEntry]) -> Vec<StatementEntry> {
    let mut ordered = entries.to_vec();
    // sort_by is stable, which is what keeps same-day entries in array order
    ordered.sort_by(|a, b| a.date.cmp_chronological(&b.date));
    ordered
}

/// Sum of credit minus debit over indices `0..=up_to_index`
///
/// Assumes `entries` is already in chronological order. An index past the
/// end is clamped to the last entry.
pub fn running_balance(entries: &[StatementEntry], up_to_index: usize) -> Money {
    entries
        .iter()
        .take(up_to_index.saturating_add(1))
        .map(StatementEntry::net)
        .sum()
}

/// Current balance of the account
///
/// Backend mode: the `balance` of the entry with the latest valid date (the
/// last such entry in array order on ties), zero when no date is valid.
/// Client mode: the running balance after the last entry, which is the total
/// of all credits minus debits.
pub fn current_balance(entries: &[StatementEntry], mode: BalanceMode) -> Money {
    match mode {
        BalanceMode::BackendAuthoritative => entries
            .iter()
            .filter(|e| e.date.is_valid())
            .max_by(|a, b| a.date.cmp_chronological(&b.date))
            .and_then(|e| e.balance)
            .unwrap_or(Decimal::ZERO),
        BalanceMode::ClientDerived => entries.iter().map(StatementEntry::net).sum(),
    }
}

/// Total credits
pub fn paid_in(entries: &[StatementEntry]) -> Money {
    entries.iter().map(|e| e.credit).sum()
}

/// Total debits
pub fn paid_out(entries: &[StatementEntry]) -> Money {
    entries.iter().map(|e| e.debit).sum()
}

/// The full ledger with balances settled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ledger {
    /// All entries in chronological order
    pub entries: Vec<StatementEntry>,
    pub current_balance: Money,
    pub paid_in: Money,
    pub paid_out: Money,
    pub mode: BalanceMode,
}

impl Ledger {
    /// Order the complete entry set and settle balances
    ///
    /// In client mode every entry gets its running balance. In backend mode
    /// balances are left exactly as supplied.
    pub fn derive(entries: &[StatementEntry], mode: BalanceMode) -> Self {
        let mut ordered = chronological(entries);

        if mode == BalanceMode::ClientDerived {
            let mut running = Decimal::ZERO;
            for entry in ordered.iter_mut() {
                running += entry.net();
                entry.balance = Some(running);
            }
        }

        Self {
            current_balance: current_balance(&ordered, mode),
            paid_in: paid_in(&ordered),
            paid_out: paid_out(&ordered),
            entries: ordered,
            mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
