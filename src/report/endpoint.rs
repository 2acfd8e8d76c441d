use std::fmt;

use super::filter::Selection;

/// Backend routes the client talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    StockLevels,
    Financials,
    WeeklyFinancials,
    SummaryFinancials,
    UserStatuses,
    MaterialGroups,
    Materials(Selection),
    Summary,
    Transactions,
}

impl Endpoint {
    /// Absolute path on the backend, without query string
    pub fn path(&self) -> String {
        match self {
            Endpoint::StockLevels => "/reports/get-stock-levels/".to_string(),
            Endpoint::Financials => "/reports/get-financials/".to_string(),
            Endpoint::WeeklyFinancials => "/reports/get-weekly-financials/".to_string(),
            Endpoint::SummaryFinancials => "/reports/get-summary-financials/".to_string(),
            Endpoint::UserStatuses => "/reports/get-user-statuses/".to_string(),
            Endpoint::MaterialGroups => "/reports/get-material-groups/".to_string(),
            Endpoint::Materials(group) => format!(
                "/reports/get-materials/{}",
                urlencoding::encode(group.as_str())
            ),
            Endpoint::Summary => "/reports/get-summary/".to_string(),
            Endpoint::Transactions => "/reports/get-transactions/".to_string(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Join a base URL and an absolute path without doubling slashes
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Page of a single inventory transaction, opened from a transactions row
pub fn transaction_page(base_url: &str, id: &str) -> String {
    join_url(
        base_url,
        &format!("/inventories/transactions/{}", urlencoding::encode(id)),
    )
}
