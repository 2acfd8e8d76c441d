//! View regions and the rule that decides which response lands in them.
//!
//! Each fetch takes a [`RequestToken`] before it goes out. A response is only
//! written into its region when its token is still the newest one issued for
//! that region, so a slow early request can never overwrite a later one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::endpoint::Endpoint;
use crate::error::Result;

/// Named output areas of the reporting pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    StockLevels,
    Financials,
    WeeklyFinancials,
    SummaryFinancials,
    UserStatuses,
    ResultsTable,
}

impl Region {
    pub fn id(&self) -> &'static str {
        match self {
            Region::StockLevels => "plot-content-stock-levels",
            Region::Financials => "plot-content-financials",
            Region::WeeklyFinancials => "plot-content-weekly-financials",
            Region::SummaryFinancials => "plot-content-summary-financials",
            Region::UserStatuses => "plot-content-user-statuses",
            Region::ResultsTable => "results-table",
        }
    }

    /// Endpoint that fills a dashboard region with an HTML fragment
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Region::StockLevels => Some(Endpoint::StockLevels),
            Region::Financials => Some(Endpoint::Financials),
            Region::WeeklyFinancials => Some(Endpoint::WeeklyFinancials),
            Region::SummaryFinancials => Some(Endpoint::SummaryFinancials),
            Region::UserStatuses => Some(Endpoint::UserStatuses),
            Region::ResultsTable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    region: Region,
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Applied,
    /// A newer request for the same region was issued meanwhile
    Stale,
    /// The fetch failed; the region keeps its previous content
    Failed,
}

struct RegionState<C> {
    content: Option<C>,
    latest: u64,
}

impl<C> Default for RegionState<C> {
    fn default() -> Self {
        Self {
            content: None,
            latest: 0,
        }
    }
}

pub struct ViewBinder<C = String> {
    regions: Mutex<HashMap<Region, RegionState<C>>>,
    next_seq: AtomicU64,
}

impl<C> Default for ViewBinder<C> {
    fn default() -> Self {
        Self {
            regions: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
        }
    }
}

impl<C: Clone> ViewBinder<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a token for a request about to be sent to `region`
    pub fn issue(&self, region: Region) -> RequestToken {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let mut regions = self.regions.lock().unwrap_or_else(|e| e.into_inner());
        regions.entry(region).or_default().latest = seq;
        log::debug!("{}: request #{} issued", region.id(), seq);
        RequestToken { region, seq }
    }

    /// Apply a finished fetch to its region.
    ///
    /// Errors are logged and dropped; the region is left untouched.
    pub fn bind(&self, token: RequestToken, result: Result<C>) -> BindOutcome {
        let region = token.region;
        let content = match result {
            Ok(content) => content,
            Err(e) => {
                log::error!("{}: request #{} failed: {}", region.id(), token.seq, e);
                return BindOutcome::Failed;
            }
        };

        let mut regions = self.regions.lock().unwrap_or_else(|e| e.into_inner());
        let state = regions.entry(region).or_default();
        if token.seq != state.latest {
            log::debug!(
                "{}: dropping response #{} (latest is #{})",
                region.id(),
                token.seq,
                state.latest
            );
            return BindOutcome::Stale;
        }
        state.content = Some(content);
        log::debug!("{}: response #{} applied", region.id(), token.seq);
        BindOutcome::Applied
    }

    /// Issue a token, run `fetch` and bind its result
    pub fn refresh<F>(&self, region: Region, fetch: F) -> BindOutcome
    where
        F: FnOnce() -> Result<C>,
    {
        let token = self.issue(region);
        self.bind(token, fetch())
    }

    pub fn content(&self, region: Region) -> Option<C> {
        let regions = self.regions.lock().unwrap_or_else(|e| e.into_inner());
        regions.get(&region).and_then(|s| s.content.clone())
    }
}
