use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Config directory not found at {0}. Run 'ims-report init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: String, to: String },

    #[error("Invalid UTC offset '{0}'. Expected e.g. '+01:00'")]
    InvalidOffset(String),

    #[error("Invalid resolution '{0}'. Use 'day', 'week' or 'month'.")]
    InvalidResolution(String),

    #[error("Invalid transaction type '{0}'. Use 'IN' or 'OUT'.")]
    InvalidTransactionType(String),

    #[error("Invalid document id '{0}': {1}")]
    InvalidDocumentId(String, String),

    #[error("Unknown document kind '{0}'. Use 'receipt' or 'dispatch'.")]
    InvalidDocumentKind(String),

    #[error("Material '{0}' is not in the material list")]
    MaterialNotFound(String),

    #[error("Cannot look up material '{material}': the material list failed to load ({reason})")]
    MaterialListUnavailable { material: String, reason: String },

    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Server returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No '{0}' cookie in session. Set [session] cookie in config.toml.")]
    CsrfTokenMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
