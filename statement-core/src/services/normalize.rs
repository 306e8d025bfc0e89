//! Normalizer - raw API payloads to canonical statement records
//!
//! Backend versions disagree on field names and casing (`Debit`/`debit`,
//! `EDate`/`eDate`/`date`, ...). Every logical field has a fixed, ordered
//! table of candidate keys and the first candidate holding a non-null value
//! wins, so the same raw object always normalizes to the same record.
//!
//! Bad individual fields degrade (amounts to zero, dates to
//! [`Timestamp::INVALID`]); only a payload whose top-level shape makes no
//! sense fails with [`Error::Normalization`].

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value as JsonValue};
use tracing::warn;

use crate::domain::result::{Error, Result};
use crate::domain::{AccountProfile, Money, StatementEntry, Timestamp};

type JsonObject = Map<String, JsonValue>;

// =============================================================================
// Candidate key tables
// =============================================================================

/// Envelope fields, in unwrap priority order
const ENVELOPE_KEYS: &[&str] = &["data", "Data", "items", "Items"];

const DATE_KEYS: &[&str] = &[
    "date",
    "Date",
    "eDate",
    "EDate",
    "edate",
    "transactionDate",
    "TransactionDate",
];
const DESCRIPTION_KEYS: &[&str] = &[
    "description",
    "Description",
    "details",
    "Details",
    "narration",
    "Narration",
    "notes",
    "Notes",
];
const DEBIT_KEYS: &[&str] = &["debit", "Debit", "DEBIT", "dr", "Dr"];
const CREDIT_KEYS: &[&str] = &["credit", "Credit", "CREDIT", "cr", "Cr"];
const BALANCE_KEYS: &[&str] = &["balance", "Balance", "runningBalance", "RunningBalance"];
/// Signed single-amount field, used only when neither debit nor credit is present
const AMOUNT_KEYS: &[&str] = &["amount", "Amount"];
const ID_KEYS: &[&str] = &["id", "Id", "ID"];
const KIND_KEYS: &[&str] = &["type", "Type", "transactionType", "TransactionType"];
const REFERENCE_KEYS: &[&str] = &["reference", "Reference", "ref", "Ref"];
const NOTES_KEYS: &[&str] = &["notes", "Notes"];
const STATUS_KEYS: &[&str] = &["status", "Status"];
const CURRENCY_KEYS: &[&str] = &["currency", "Currency"];

const NAME_KEYS: &[&str] = &[
    "name",
    "Name",
    "clientName",
    "ClientName",
    "supplierName",
    "SupplierName",
    "accountName",
    "AccountName",
];
const PHONE_KEYS: &[&str] = &["phone", "Phone", "mobile", "Mobile", "phoneNumber", "PhoneNumber"];
const ADDRESS_KEYS: &[&str] = &["address", "Address"];
const COMPANY_KEYS: &[&str] = &["company", "Company", "companyName", "CompanyName"];
const EXTERNAL_URL_KEYS: &[&str] = &["externalUrl", "ExternalUrl", "url", "Url", "website", "Website"];
const ACCOUNT_NUMBER_KEYS: &[&str] = &["accountNumber", "AccountNumber", "vatNumber", "VatNumber"];
const PROFILE_BALANCE_KEYS: &[&str] = &["balance", "Balance", "currentBalance", "CurrentBalance"];
const LAST_TRANSACTION_KEYS: &[&str] = &["lastTransactionDate", "LastTransactionDate"];
const FROM_DATE_KEYS: &[&str] = &["fromDate", "FromDate"];
const TO_DATE_KEYS: &[&str] = &["toDate", "ToDate"];

const MESSAGE_KEYS: &[&str] = &["message", "Message", "error", "Error"];
const SUCCESS_KEYS: &[&str] = &["success", "Success"];

// =============================================================================
// Public API
// =============================================================================

/// Normalize a transactions payload into ledger entries
///
/// Accepts a bare array or an envelope around one. A `null` payload is an
/// empty ledger. Array items that are not objects are skipped.
pub fn normalize_entries(raw: &JsonValue) -> Result<Vec<StatementEntry>> {
    check_envelope_status(raw)?;

    match unwrap_envelope(raw) {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::Array(items) => Ok(items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match item.as_object() {
                Some(obj) => Some(normalize_entry(obj)),
                None => {
                    warn!(index, kind = json_kind(item), "Skipping non-object ledger entry");
                    None
                }
            })
            .collect()),
        other => Err(Error::normalization(format!(
            "expected a list of entries, got {}",
            json_kind(other)
        ))),
    }
}

/// Normalize a statement payload into the account profile
pub fn normalize_profile(raw: &JsonValue) -> Result<AccountProfile> {
    check_envelope_status(raw)?;

    let value = unwrap_envelope(raw);
    let obj = value.as_object().ok_or_else(|| {
        Error::normalization(format!("expected a statement object, got {}", json_kind(value)))
    })?;

    Ok(AccountProfile {
        name: text(obj, NAME_KEYS).unwrap_or_default(),
        phone: text(obj, PHONE_KEYS),
        address: text(obj, ADDRESS_KEYS),
        company: text(obj, COMPANY_KEYS),
        external_url: text(obj, EXTERNAL_URL_KEYS),
        account_number: text(obj, ACCOUNT_NUMBER_KEYS),
        currency: text(obj, CURRENCY_KEYS),
        balance: resolve(obj, PROFILE_BALANCE_KEYS).and_then(parse_money),
        last_transaction_date: valid_date(obj, LAST_TRANSACTION_KEYS),
        status: text(obj, STATUS_KEYS),
        from_date: valid_date(obj, FROM_DATE_KEYS),
        to_date: valid_date(obj, TO_DATE_KEYS),
    })
}

/// Unwrap one envelope level: `data`, then `Data`, `items`, `Items`,
/// otherwise the value itself
pub fn unwrap_envelope(raw: &JsonValue) -> &JsonValue {
    if let Some(obj) = raw.as_object() {
        for key in ENVELOPE_KEYS {
            if let Some(inner) = obj.get(*key) {
                return inner;
            }
        }
    }
    raw
}

/// Parse a money value: numbers as-is, strings with thousands separators stripped
pub fn parse_money(value: &JsonValue) -> Option<Money> {
    match value {
        JsonValue::Number(n) => parse_decimal(&n.to_string()),
        JsonValue::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, ',' | '\u{066C}' | '\'' | '_') && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                parse_decimal(&cleaned)
            }
        }
        _ => None,
    }
}

/// Parse a date value into a timestamp
///
/// Accepted: RFC 3339 / ISO 8601 strings (with or without time and offset),
/// `dd/mm/yyyy[ hh:mm[:ss]]`, and numbers as epoch milliseconds. Anything
/// else is [`Timestamp::INVALID`].
pub fn parse_timestamp(value: &JsonValue) -> Timestamp {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| Timestamp::new(dt.naive_utc()))
            .unwrap_or(Timestamp::INVALID),
        JsonValue::String(s) => parse_date_str(s.trim()),
        _ => Timestamp::INVALID,
    }
}

// =============================================================================
// Internals
// =============================================================================

fn normalize_entry(obj: &JsonObject) -> StatementEntry {
    let date = resolve(obj, DATE_KEYS)
        .map(parse_timestamp)
        .unwrap_or(Timestamp::INVALID);

    let debit_raw = resolve(obj, DEBIT_KEYS);
    let credit_raw = resolve(obj, CREDIT_KEYS);

    let (debit, credit) = if debit_raw.is_none() && credit_raw.is_none() {
        split_signed_amount(resolve(obj, AMOUNT_KEYS).and_then(parse_money))
    } else {
        (
            non_negative(debit_raw, "debit"),
            non_negative(credit_raw, "credit"),
        )
    };

    let mut entry = StatementEntry::new(
        date,
        text(obj, DESCRIPTION_KEYS).unwrap_or_default(),
        debit,
        credit,
    );
    entry.balance = resolve(obj, BALANCE_KEYS).and_then(parse_money);
    entry.id = text(obj, ID_KEYS);
    entry.kind = text(obj, KIND_KEYS);
    entry.reference = text(obj, REFERENCE_KEYS);
    entry.notes = text(obj, NOTES_KEYS);
    entry.status = text(obj, STATUS_KEYS);
    entry.currency = text(obj, CURRENCY_KEYS);
    entry
}

/// First candidate key holding a non-null value
fn resolve<'a>(obj: &'a JsonObject, keys: &[&str]) -> Option<&'a JsonValue> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Text field: strings as-is, scalars stringified, empty strings dropped
fn text(obj: &JsonObject, keys: &[&str]) -> Option<String> {
    let value = match resolve(obj, keys)? {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => return None,
    };
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn valid_date(obj: &JsonObject, keys: &[&str]) -> Option<Timestamp> {
    resolve(obj, keys)
        .map(parse_timestamp)
        .filter(Timestamp::is_valid)
}

/// Debit/credit are never negative: unparseable or negative values become zero
fn non_negative(value: Option<&JsonValue>, field: &'static str) -> Money {
    match value.and_then(parse_money) {
        Some(amount) if amount < Decimal::ZERO => {
            warn!(field, "Negative amount in ledger entry, treating as zero");
            Decimal::ZERO
        }
        Some(amount) => amount,
        None => Decimal::ZERO,
    }
}

/// Positive signed amounts are credits, negative ones debits
fn split_signed_amount(amount: Option<Money>) -> (Money, Money) {
    match amount {
        Some(a) if a < Decimal::ZERO => (-a, Decimal::ZERO),
        Some(a) => (Decimal::ZERO, a),
        None => (Decimal::ZERO, Decimal::ZERO),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

fn day_month_year_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})(?:[ T](\d{1,2}):(\d{2})(?::(\d{2}))?)?$").ok()
        })
        .as_ref()
}

fn parse_date_str(s: &str) -> Timestamp {
    if s.is_empty() {
        return Timestamp::INVALID;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Timestamp::new(dt.naive_utc());
    }

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Timestamp::new(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Timestamp::from_date(date);
    }

    day_month_year_pattern()
        .and_then(|re| re.captures(s))
        .and_then(|caps| {
            let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
            let year = caps.get(3)?.as_str().parse::<i32>().ok()?;
            let date = NaiveDate::from_ymd_opt(year, field(2)?, field(1)?)?;
            let (hour, minute, second) = match field(4) {
                Some(hour) => (hour, field(5)?, field(6).unwrap_or(0)),
                None => (0, 0, 0),
            };
            date.and_hms_opt(hour, minute, second)
        })
        .map(Timestamp::new)
        .unwrap_or(Timestamp::INVALID)
}

/// An envelope reporting `success: false` is a server-side failure even on HTTP 200
fn check_envelope_status(raw: &JsonValue) -> Result<()> {
    let Some(obj) = raw.as_object() else {
        return Ok(());
    };
    if resolve(obj, SUCCESS_KEYS).and_then(JsonValue::as_bool) == Some(false) {
        return Err(Error::server(200, text(obj, MESSAGE_KEYS)));
    }
    Ok(())
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_field_name_variants_normalize_identically() {
        let variants = [
            json!([{"Debit": 1200.5, "Credit": 0, "EDate": "05/12/2024", "Description": "Order"}]),
            json!([{"debit": "1,200.50", "credit": "0", "eDate": "2024-12-05", "description": "Order"}]),
            json!({"data": [{"debit": 1200.5, "credit": 0, "date": "2024-12-05T00:00:00", "description": "Order"}]}),
            json!({"items": [{"DEBIT": "1200.5", "CREDIT": null, "Date": "05/12/2024 00:00", "Details": "Order"}]}),
        ];

        let normalized: Vec<_> = variants
            .iter()
            .map(|raw| normalize_entries(raw).unwrap())
            .collect();

        for entries in &normalized {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0], normalized[0][0]);
        }
        assert_eq!(normalized[0][0].debit, Decimal::new(12005, 1));
        assert_eq!(normalized[0][0].credit, Decimal::ZERO);
        assert_eq!(normalized[0][0].date, ymd(2024, 12, 5));
    }

    #[test]
    fn test_normalization_is_deterministic() {
        // Both spellings present: the table order decides, not map order
        let raw = json!([{"EDate": "01/01/2024", "date": "2024-06-30", "Debit": 5, "debit": 7}]);
        let first = normalize_entries(&raw).unwrap();
        let second = normalize_entries(&raw).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].date, ymd(2024, 6, 30));
        assert_eq!(first[0].debit, Decimal::new(7, 0));
    }

    #[test]
    fn test_envelope_priority() {
        let raw = json!({"items": [{"credit": 1}], "data": [{"credit": 2}, {"credit": 3}]});
        assert_eq!(normalize_entries(&raw).unwrap().len(), 2);

        let raw = json!({"Data": [{"credit": 1}]});
        assert_eq!(normalize_entries(&raw).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_and_bad_fields_degrade() {
        let raw = json!([{"debit": "abc", "date": "not a date"}, {}]);
        let entries = normalize_entries(&raw).unwrap();
        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert_eq!(entry.debit, Decimal::ZERO);
            assert_eq!(entry.credit, Decimal::ZERO);
            assert_eq!(entry.description, "");
            assert!(!entry.date.is_valid());
            assert!(entry.balance.is_none());
        }
    }

    #[test]
    fn test_negative_amounts_are_zeroed() {
        let raw = json!([{"debit": -50, "credit": "-10.5"}]);
        let entries = normalize_entries(&raw).unwrap();
        assert_eq!(entries[0].debit, Decimal::ZERO);
        assert_eq!(entries[0].credit, Decimal::ZERO);
    }

    #[test]
    fn test_signed_amount_is_split() {
        let raw = json!([
            {"type": "Deposit", "amount": 5000, "date": "2024-12-01", "notes": "Initial"},
            {"type": "Purchase", "amount": -1200.5, "date": "2024-12-05", "notes": "Order #A102"}
        ]);
        let entries = normalize_entries(&raw).unwrap();
        assert_eq!(entries[0].credit, Decimal::new(5000, 0));
        assert_eq!(entries[0].debit, Decimal::ZERO);
        assert_eq!(entries[1].debit, Decimal::new(12005, 1));
        assert_eq!(entries[1].credit, Decimal::ZERO);
        assert_eq!(entries[1].kind.as_deref(), Some("Purchase"));
        // No description field: notes stand in
        assert_eq!(entries[1].description, "Order #A102");
    }

    #[test]
    fn test_structural_failures() {
        assert!(matches!(
            normalize_entries(&json!("oops")),
            Err(Error::Normalization(_))
        ));
        assert!(matches!(
            normalize_entries(&json!({"foo": 1})),
            Err(Error::Normalization(_))
        ));
        assert!(matches!(
            normalize_profile(&json!([1, 2])),
            Err(Error::Normalization(_))
        ));
        assert!(normalize_entries(&json!(null)).unwrap().is_empty());
        assert!(normalize_entries(&json!({"data": null})).unwrap().is_empty());
    }

    #[test]
    fn test_non_object_items_skipped() {
        let raw = json!([1, {"credit": 10}, "x"]);
        let entries = normalize_entries(&raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].credit, Decimal::new(10, 0));
    }

    #[test]
    fn test_unsuccessful_envelope_is_server_error() {
        let raw = json!({"success": false, "message": "Invalid link", "data": null});
        match normalize_profile(&raw) {
            Err(Error::Server { message, .. }) => assert_eq!(message, "Invalid link"),
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_date_formats() {
        let with_time = parse_timestamp(&json!("05/12/2024 14:30:15"));
        assert_eq!(
            with_time.value().unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 5)
                .unwrap()
                .and_hms_opt(14, 30, 15)
                .unwrap()
        );
        assert_eq!(parse_timestamp(&json!("2024-12-05T10:00:00Z")).day(), ymd(2024, 12, 5).day());
        assert_eq!(parse_timestamp(&json!(1733356800000_i64)).day(), ymd(2024, 12, 5).day());
        assert!(!parse_timestamp(&json!("31/02/2024")).is_valid());
        assert!(!parse_timestamp(&json!("")).is_valid());
        assert!(!parse_timestamp(&json!(true)).is_valid());
    }

    #[test]
    fn test_money_parsing() {
        assert_eq!(parse_money(&json!("1,234,567.89")), Some(Decimal::new(123456789, 2)));
        assert_eq!(parse_money(&json!("12 500")), Some(Decimal::new(12500, 0)));
        assert_eq!(parse_money(&json!(42)), Some(Decimal::new(42, 0)));
        assert_eq!(parse_money(&json!("NaN")), None);
        assert_eq!(parse_money(&json!("")), None);
        assert_eq!(parse_money(&json!([1])), None);
    }

    #[test]
    fn test_profile_normalization() {
        let raw = json!({
            "success": true,
            "data": {
                "supplierName": "Demo Supplier",
                "vatNumber": "EG-VAT-555-222",
                "balance": "9,320.10",
                "currency": "EGP",
                "Phone": "+20 100 000 0000",
                "lastTransactionDate": "2024-12-06",
                "status": "Active"
            }
        });
        let profile = normalize_profile(&raw).unwrap();
        assert_eq!(profile.name, "Demo Supplier");
        assert_eq!(profile.account_number.as_deref(), Some("EG-VAT-555-222"));
        assert_eq!(profile.balance, Some(Decimal::new(932010, 2)));
        assert_eq!(profile.phone.as_deref(), Some("+20 100 000 0000"));
        assert_eq!(profile.last_transaction_date, Some(ymd(2024, 12, 6)));
        assert!(profile.address.is_none());
        assert!(profile.is_active());
    }

    #[test]
    fn test_profile_unparseable_balance_is_absent() {
        let profile = normalize_profile(&json!({"Name": "X", "Balance": "n/a"})).unwrap();
        assert_eq!(profile.name, "X");
        assert!(profile.balance.is_none());
    }
}
