//! Result tables: rows are pulled from the backend on demand and rendered
//! as terminal tables.

use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use super::binder::{BindOutcome, Region, ViewBinder};
use super::endpoint::Endpoint;
use super::fetcher::{ReportFetcher, Transport};
use super::filter::{FilterState, ReportKind};
use crate::error::Result;

/// Backend-owned record, passed through untouched
pub type ReportRow = Value;

/// Columns shown for transaction rows, in order
pub const TRANSACTION_COLUMNS: &[&str] = &[
    "transaction_time",
    "transaction_type",
    "material_group",
    "material",
    "net_weight",
    "unit_price",
    "net_value",
    "partner",
];

/// Columns shown for summary rows, in order
pub const SUMMARY_COLUMNS: &[&str] = &[
    "start_of_period",
    "end_of_period",
    "qty_opening",
    "qty_in",
    "qty_out",
    "qty_closing",
];

/// Hands out one page of rows for a filter
pub trait RowSource {
    fn fetch_page(&self, state: &FilterState) -> Result<Vec<ReportRow>>;
}

/// Summary or transactions rows straight from the reporting API
pub struct ReportSource<'a, T: Transport> {
    fetcher: &'a ReportFetcher<T>,
    kind: ReportKind,
}

impl<'a, T: Transport> ReportSource<'a, T> {
    pub fn new(fetcher: &'a ReportFetcher<T>, kind: ReportKind) -> Self {
        Self { fetcher, kind }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self.kind {
            ReportKind::Summary => Endpoint::Summary,
            ReportKind::Transactions => Endpoint::Transactions,
        }
    }

    /// URL a page request would go to
    pub fn url(&self, state: &FilterState) -> String {
        self.fetcher.url(&self.endpoint(), &state.serialize(self.kind))
    }
}

impl<T: Transport> RowSource for ReportSource<'_, T> {
    fn fetch_page(&self, state: &FilterState) -> Result<Vec<ReportRow>> {
        self.fetcher
            .fetch_json(&self.endpoint(), &state.serialize(self.kind))
    }
}

/// The results table: pulls rows from its source on every refresh
pub struct ReportTable<S: RowSource> {
    source: S,
    view: ViewBinder<Vec<ReportRow>>,
}

impl<S: RowSource> ReportTable<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            view: ViewBinder::new(),
        }
    }

    pub fn refresh(&self, state: &FilterState) -> BindOutcome {
        self.view
            .refresh(Region::ResultsTable, || self.source.fetch_page(state))
    }

    /// Rows currently on display, `None` before the first successful load
    pub fn rows(&self) -> Option<Vec<ReportRow>> {
        self.view.content(Region::ResultsTable)
    }
}

/// Group the integer part of a number with thousands separators
pub fn format_number(raw: &str) -> String {
    let (sign, rest) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let (whole, frac) = match rest.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (rest, None),
    };
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return raw.to_string();
    }

    let mut out = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    let grouped: String = out.chars().rev().collect();

    match frac {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => format_number(&n.to_string()),
        Some(other) => other.to_string(),
    }
}

fn all_keys(rows: &[ReportRow]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
    }
    keys
}

/// Render rows as a table. With no `columns`, every key found is shown.
pub fn render_table(rows: &[ReportRow], columns: &[&str]) -> String {
    let columns: Vec<String> = if columns.is_empty() {
        all_keys(rows)
    } else {
        columns.iter().map(|c| c.to_string()).collect()
    };

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_uppercase()));
    for row in rows {
        builder.push_record(columns.iter().map(|c| cell(row.get(c.as_str()))));
    }
    builder.build().with(Style::rounded()).to_string()
}

/// One card per summary period
pub fn render_summary_cards(rows: &[ReportRow]) -> String {
    let labels = [
        ("Opening", "qty_opening"),
        ("In", "qty_in"),
        ("Out", "qty_out"),
        ("Closing", "qty_closing"),
    ];

    rows.iter()
        .map(|row| {
            let mut builder = Builder::default();
            builder.push_record([
                cell(row.get("start_of_period")),
                cell(row.get("end_of_period")),
            ]);
            for (label, key) in labels {
                let value = match row.get(key) {
                    Some(Value::String(s)) => format_number(s),
                    other => cell(other),
                };
                builder.push_record([label.to_string(), value]);
            }
            builder.build().with(Style::rounded()).to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
