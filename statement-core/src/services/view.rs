//! View derivation - filtering, multi-key sorting and column order
//!
//! Everything here produces a new derived view; the ledger it starts from is
//! never touched. Balances already attached to entries are carried as they
//! are: a filtered subset keeps the running balance of the full ledger.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::StatementEntry;

// =============================================================================
// Columns
// =============================================================================

/// A ledger table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Date,
    Description,
    Kind,
    Reference,
    Debit,
    Credit,
    Balance,
}

/// How a column's values compare and filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Text,
    Numeric,
}

impl Column {
    /// Default display order
    pub const ALL: [Column; 7] = [
        Column::Date,
        Column::Description,
        Column::Kind,
        Column::Reference,
        Column::Debit,
        Column::Credit,
        Column::Balance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::Description => "description",
            Column::Kind => "type",
            Column::Reference => "reference",
            Column::Debit => "debit",
            Column::Credit => "credit",
            Column::Balance => "balance",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Date => ColumnKind::Date,
            Column::Description | Column::Kind | Column::Reference => ColumnKind::Text,
            Column::Debit | Column::Credit | Column::Balance => ColumnKind::Numeric,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(Column::Date),
            "description" | "desc" => Ok(Column::Description),
            "type" | "kind" => Ok(Column::Kind),
            "reference" | "ref" => Ok(Column::Reference),
            "debit" => Ok(Column::Debit),
            "credit" => Ok(Column::Credit),
            "balance" => Ok(Column::Balance),
            other => Err(Error::validation(format!("unknown column: {}", other))),
        }
    }
}

/// Comparable value of one cell
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum CellValue<'a> {
    Time(NaiveDateTime),
    Number(Decimal),
    Text(&'a str),
}

/// Cell value, `None` when the cell has nothing to compare (invalid date,
/// missing balance). Such cells are excluded from ordering and ranges.
fn cell(entry: &StatementEntry, column: Column) -> Option<CellValue<'_>> {
    match column {
        Column::Date => entry.date.value().map(CellValue::Time),
        Column::Description => Some(CellValue::Text(&entry.description)),
        Column::Kind => Some(CellValue::Text(entry.kind.as_deref().unwrap_or(""))),
        Column::Reference => Some(CellValue::Text(entry.reference.as_deref().unwrap_or(""))),
        Column::Debit => Some(CellValue::Number(entry.debit)),
        Column::Credit => Some(CellValue::Number(entry.credit)),
        Column::Balance => entry.balance.map(CellValue::Number),
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Criteria for a single column filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FilterCriteria {
    /// Case-insensitive substring match
    Text(String),
    /// Calendar-day range; see [`date_in_range`]
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// Inclusive numeric bounds
    Range {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
}

impl FilterCriteria {
    /// Criteria that match everything
    pub fn is_empty(&self) -> bool {
        match self {
            FilterCriteria::Text(needle) => needle.trim().is_empty(),
            FilterCriteria::DateRange { start, end } => start.is_none() && end.is_none(),
            FilterCriteria::Range { min, max } => min.is_none() && max.is_none(),
        }
    }

    fn fits(&self, kind: ColumnKind) -> bool {
        matches!(
            (self, kind),
            (FilterCriteria::Text(_), ColumnKind::Text)
                | (FilterCriteria::DateRange { .. }, ColumnKind::Date)
                | (FilterCriteria::Range { .. }, ColumnKind::Numeric)
        )
    }

    fn matches(&self, entry: &StatementEntry, column: Column) -> bool {
        if self.is_empty() {
            return true;
        }
        match (self, cell(entry, column)) {
            (FilterCriteria::Text(needle), Some(CellValue::Text(haystack))) => haystack
                .to_lowercase()
                .contains(&needle.trim().to_lowercase()),
            (FilterCriteria::DateRange { start, end }, value) => {
                let day = match value {
                    Some(CellValue::Time(t)) => Some(t.date()),
                    _ => None,
                };
                date_in_range(day, *start, *end)
            }
            (FilterCriteria::Range { min, max }, Some(CellValue::Number(n))) => {
                min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m)
            }
            _ => false,
        }
    }
}

/// Day-granularity date predicate
///
/// Both bounds: inclusive range. Only `start`: that exact day. Only `end`:
/// on or before it. Neither: everything, including undated rows.
pub fn date_in_range(day: Option<NaiveDate>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    match (start, end, day) {
        (None, None, _) => true,
        (_, _, None) => false,
        (Some(s), Some(e), Some(d)) => s <= d && d <= e,
        (Some(s), None, Some(d)) => d == s,
        (None, Some(e), Some(d)) => d <= e,
    }
}

/// How many column filters may be active at once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// One active column at a time (paged, viewport-constrained view)
    Single,
    /// Column filters combine with AND (full table)
    #[default]
    Combined,
}

/// Active column filters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSet {
    filters: BTreeMap<Column, FilterCriteria>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter for a column
    ///
    /// In single mode any other column's filter is dropped first. Empty
    /// criteria clear the column.
    pub fn set(&mut self, column: Column, criteria: FilterCriteria, mode: FilterMode) -> Result<()> {
        if !criteria.fits(column.kind()) {
            return Err(Error::validation(format!(
                "filter does not apply to the {} column",
                column
            )));
        }
        if mode == FilterMode::Single {
            self.filters.retain(|c, _| *c == column);
        }
        if criteria.is_empty() {
            self.filters.remove(&column);
        } else {
            self.filters.insert(column, criteria);
        }
        Ok(())
    }

    /// Remove the filter on a column, returning whether one was set
    pub fn clear(&mut self, column: Column) -> bool {
        self.filters.remove(&column).is_some()
    }

    pub fn clear_all(&mut self) {
        self.filters.clear();
    }

    pub fn get(&self, column: Column) -> Option<&FilterCriteria> {
        self.filters.get(&column)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Keep only the first active filter in column order
    pub fn retain_first(&mut self) {
        if let Some(first) = self.filters.keys().next().copied() {
            self.filters.retain(|c, _| *c == first);
        }
    }

    /// Active filters in column order
    pub fn iter(&self) -> impl Iterator<Item = (&Column, &FilterCriteria)> {
        self.filters.iter()
    }

    /// Whether an entry passes every active filter
    pub fn matches(&self, entry: &StatementEntry) -> bool {
        self.filters
            .iter()
            .all(|(column, criteria)| criteria.matches(entry, *column))
    }
}

/// Entries passing the filter set, in their original order
pub fn filter(entries: &[StatementEntry], filters: &FilterSet) -> Vec<StatementEntry> {
    entries
        .iter()
        .filter(|e| filters.matches(e))
        .cloned()
        .collect()
}

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One level of a multi-key sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

/// Parses `column` or `column:asc` / `column:desc` (also a leading `-` for descending)
impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(column) = s.strip_prefix('-') {
            return Ok(SortKey::desc(column.parse()?));
        }
        match s.split_once(':') {
            Some((column, dir)) => match dir.trim().to_lowercase().as_str() {
                "asc" | "ascending" => Ok(SortKey::asc(column.parse()?)),
                "desc" | "descending" => Ok(SortKey::desc(column.parse()?)),
                other => Err(Error::validation(format!("unknown sort direction: {}", other))),
            },
            None => Ok(SortKey::asc(s.parse()?)),
        }
    }
}

/// Compare two entries under an ordered key list; first non-equal key wins
///
/// Cells with nothing to compare (invalid dates, missing balances) order
/// after every present value whichever the direction.
pub fn compare_entries(a: &StatementEntry, b: &StatementEntry, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = match (cell(a, key.column), cell(b, key.column)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => match key.direction {
                SortDirection::Ascending => x.cmp(&y),
                SortDirection::Descending => y.cmp(&x),
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable multi-key sort; full ties keep their incoming order
pub fn sort(entries: &[StatementEntry], keys: &[SortKey]) -> Vec<StatementEntry> {
    let mut sorted = entries.to_vec();
    if !keys.is_empty() {
        sorted.sort_by(|a, b| compare_entries(a, b, keys));
    }
    sorted
}

/// Filter, then sort
pub fn derive_view(entries: &[StatementEntry], filters: &FilterSet, keys: &[SortKey]) -> Vec<StatementEntry> {
    sort(&filter(entries, filters), keys)
}

// =============================================================================
// Column order
// =============================================================================

/// Reading direction of the active language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    /// Direction for a language code such as "ar" or "en-US"
    pub fn for_language(language: &str) -> Self {
        let primary = language
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_lowercase();
        match primary.as_str() {
            "ar" | "he" | "fa" | "ur" => TextDirection::Rtl,
            _ => TextDirection::Ltr,
        }
    }
}

/// Display order of the table columns, independent of the data order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnOrder(Vec<Column>);

impl Default for ColumnOrder {
    fn default() -> Self {
        Self(Column::ALL.to_vec())
    }
}

impl ColumnOrder {
    /// A column order with no duplicates
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(**c)) {
            return Err(Error::validation(format!("column {} listed twice", dup)));
        }
        Ok(Self(columns))
    }

    pub fn columns(&self) -> &[Column] {
        &self.0
    }

    /// Move the column at gesture position `from` to position `to`
    ///
    /// Positions come from the drag gesture. Right-to-left, they are mirrored
    /// (`last - index`) before the move so the column lands where it was
    /// dropped on screen.
    pub fn move_column(&self, from: usize, to: usize, direction: TextDirection) -> Result<Self> {
        let len = self.0.len();
        if from >= len || to >= len {
            return Err(Error::validation(format!(
                "column move {} -> {} out of range for {} columns",
                from, to, len
            )));
        }

        let last = len - 1;
        let (from, to) = match direction {
            TextDirection::Ltr => (from, to),
            TextDirection::Rtl => (last - from, last - to),
        };

        let mut columns = self.0.clone();
        let column = columns.remove(from);
        columns.insert(to, column);
        Ok(Self(columns))
    }
}
