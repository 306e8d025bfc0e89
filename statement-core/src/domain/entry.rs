//! Statement entry domain model

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monetary amount. Debit and credit are never negative once normalized.
pub type Money = Decimal;

/// Point in time of a ledger entry
///
/// A raw date that matched none of the accepted patterns becomes
/// [`Timestamp::INVALID`]. Invalid timestamps take no part in date-based
/// min/max, sorting or range filters; they are never treated as the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(Option<NaiveDateTime>);

impl Timestamp {
    pub const INVALID: Timestamp = Timestamp(None);

    pub fn new(value: NaiveDateTime) -> Self {
        Self(Some(value))
    }

    /// Midnight of the given day
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(0, 0, 0))
    }

    pub fn value(&self) -> Option<NaiveDateTime> {
        self.0
    }

    /// Calendar day, time-of-day dropped
    pub fn day(&self) -> Option<NaiveDate> {
        self.0.map(|dt| dt.date())
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Chronological comparison; invalid timestamps order after every valid one
    pub fn cmp_chronological(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dt) if dt.time() == chrono::NaiveTime::MIN => write!(f, "{}", dt.format("%Y-%m-%d")),
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            None => write!(f, "-"),
        }
    }
}

/// A single normalized ledger line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    pub date: Timestamp,
    /// Never null, possibly empty
    pub description: String,
    pub debit: Money,
    pub credit: Money,
    /// Backend-supplied or derived running balance
    pub balance: Option<Money>,

    // =========================================================================
    // Optional details carried through from the API
    // =========================================================================
    pub id: Option<String>,
    /// Transaction type, e.g. "Invoice" or "Payment"
    pub kind: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub currency: Option<String>,
}

impl StatementEntry {
    /// Create an entry with the required fields
    pub fn new(date: Timestamp, description: impl Into<String>, debit: Money, credit: Money) -> Self {
        Self {
            date,
            description: description.into(),
            debit,
            credit,
            balance: None,
            id: None,
            kind: None,
            reference: None,
            notes: None,
            status: None,
            currency: None,
        }
    }

    /// Effect of this entry on the account: credit minus debit
    pub fn net(&self) -> Money {
        self.credit - self.debit
    }
}
