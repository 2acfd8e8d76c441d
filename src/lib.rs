pub mod config;
pub mod error;
pub mod pdf;
pub mod report;

pub use config::Config;
pub use error::{ReportError, Result};
pub use report::{Filter, FilterState, MaterialPicker, ReportFetcher, ViewBinder};
