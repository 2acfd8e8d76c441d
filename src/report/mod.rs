mod binder;
mod endpoint;
pub(crate) mod fetcher;
mod filter;
mod picker;
mod table;

pub use binder::{BindOutcome, Region, RequestToken, ViewBinder};
pub use endpoint::{join_url, transaction_page, Endpoint};
pub use fetcher::{HttpResponse, HttpTransport, Method, ReportFetcher, Transport};
pub use filter::{
    parse_date, EmptyTypesPolicy, Filter, FilterState, QueryParams, ReportKind, Resolution,
    Selection, TransactionType, ALL_VALUES_ID,
};
pub use picker::{Catalog, MaterialGroupOption, MaterialOption, MaterialPicker};
pub use table::{
    format_number, render_summary_cards, render_table, ReportRow, ReportSource, ReportTable,
    RowSource, SUMMARY_COLUMNS, TRANSACTION_COLUMNS,
};
