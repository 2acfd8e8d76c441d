//! Report filters and their query-string form.
//!
//! A [`Filter`] holds what the user has narrowed a report down to. A
//! [`FilterState`] pairs it with the serialization options read from config
//! and turns it into the ordered query parameters the backend expects.

use chrono::{Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ReportError, Result};

/// Select value meaning "no restriction"
pub const ALL_VALUES_ID: &str = "all";

/// Current value of a group or material selector
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Id(String),
}

impl Selection {
    /// `"all"` and the empty string both mean no restriction
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_VALUES_ID {
            Selection::All
        } else {
            Selection::Id(value.to_string())
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Id(id) => Some(id),
        }
    }

    /// Value as it appears in a select element or URL path segment
    pub fn as_str(&self) -> &str {
        self.id().unwrap_or(ALL_VALUES_ID)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransactionType {
    In,
    Out,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Ok(TransactionType::In),
            "OUT" => Ok(TransactionType::Out),
            _ => Err(ReportError::InvalidTransactionType(s.to_string())),
        }
    }
}

/// Temporal granularity of the summary report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    Day,
    #[default]
    Week,
    Month,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Day => "DAY",
            Resolution::Week => "WEEK",
            Resolution::Month => "MONTH",
        }
    }
}

impl FromStr for Resolution {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DAY" => Ok(Resolution::Day),
            "WEEK" => Ok(Resolution::Week),
            "MONTH" => Ok(Resolution::Month),
            _ => Err(ReportError::InvalidResolution(s.to_string())),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to send when neither IN nor OUT is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyTypesPolicy {
    /// Send a single empty `transaction_types=` value
    #[default]
    Marker,
    /// Leave `transaction_types` out of the query
    Omit,
}

/// Which report a filter is serialized for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Summary,
    Transactions,
}

/// Parse a `YYYY-MM-DD` date box value
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ReportError::InvalidDate(input.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    date_from: NaiveDate,
    date_to: NaiveDate,
    pub material_group: Selection,
    pub material: Selection,
    pub transaction_types: BTreeSet<TransactionType>,
    pub resolution: Resolution,
}

impl Filter {
    /// Filter spanning the calendar month of today
    pub fn current_month() -> Self {
        Self::for_month_of(Local::now().date_naive())
    }

    pub fn for_month_of(day: NaiveDate) -> Self {
        let first = day.with_day(1).unwrap_or(day);
        let last = first
            .checked_add_months(chrono::Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(day);
        Self {
            date_from: first,
            date_to: last,
            material_group: Selection::All,
            material: Selection::All,
            transaction_types: BTreeSet::new(),
            resolution: Resolution::default(),
        }
    }

    pub fn date_from(&self) -> NaiveDate {
        self.date_from
    }

    pub fn date_to(&self) -> NaiveDate {
        self.date_to
    }

    /// Replace the date range, keeping `from <= to`
    pub fn set_dates(&mut self, from: NaiveDate, to: NaiveDate) -> Result<()> {
        if from > to {
            return Err(ReportError::InvalidDateRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.date_from = from;
        self.date_to = to;
        Ok(())
    }

    pub fn set_transaction_type(&mut self, kind: TransactionType, checked: bool) {
        if checked {
            self.transaction_types.insert(kind);
        } else {
            self.transaction_types.remove(&kind);
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::current_month()
    }
}

/// Ordered query parameters, repeated keys allowed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.0.push((key.to_string(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Percent-encoded `k=v&k=v` form
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| {
                format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A filter plus the options that decide how it is written to a query
#[derive(Debug, Clone)]
pub struct FilterState {
    pub filter: Filter,
    pub utc_offset: Option<FixedOffset>,
    pub empty_types: EmptyTypesPolicy,
}

impl FilterState {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            utc_offset: None,
            empty_types: EmptyTypesPolicy::default(),
        }
    }

    pub fn with_offset(mut self, offset: Option<FixedOffset>) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn with_empty_types(mut self, policy: EmptyTypesPolicy) -> Self {
        self.empty_types = policy;
        self
    }

    /// Start of `date_from` in ISO 8601 with milliseconds
    pub fn date_from_param(&self) -> String {
        let start = self
            .filter
            .date_from
            .and_hms_milli_opt(0, 0, 0, 0)
            .unwrap_or_default();
        self.format_bound(start)
    }

    /// Last millisecond of `date_to`
    pub fn date_to_param(&self) -> String {
        let end = self
            .filter
            .date_to
            .and_hms_milli_opt(23, 59, 59, 999)
            .unwrap_or_default();
        self.format_bound(end)
    }

    fn format_bound(&self, at: NaiveDateTime) -> String {
        let base = at.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        match self.utc_offset {
            Some(offset) => format!("{base}{offset}"),
            None => base,
        }
    }

    pub fn serialize(&self, kind: ReportKind) -> QueryParams {
        let filter = &self.filter;
        let mut params = QueryParams::new();

        if kind == ReportKind::Summary {
            params.push("resolution", filter.resolution.as_str());
        }
        params.push("date_from", self.date_from_param());
        params.push("date_to", self.date_to_param());
        if let Some(group) = filter.material_group.id() {
            params.push("material_group", group);
        }
        if let Some(material) = filter.material.id() {
            params.push("material", material);
        }

        if kind == ReportKind::Transactions {
            if filter.transaction_types.is_empty() {
                if self.empty_types == EmptyTypesPolicy::Marker {
                    params.push("transaction_types", "");
                }
            } else {
                for ty in &filter.transaction_types {
                    params.push("transaction_types", ty.as_str());
                }
            }
        }

        params
    }
}
