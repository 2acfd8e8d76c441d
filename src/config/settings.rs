use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::report::EmptyTypesPolicy;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub filter: FilterSettings,
    #[serde(default)]
    pub documents: DocumentSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Whole-request timeout; 0 waits forever
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionSettings {
    /// Raw Cookie header of a logged-in browser session
    #[serde(default)]
    pub cookie: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FilterSettings {
    #[serde(default)]
    pub utc_offset: Option<String>,
    #[serde(default)]
    pub empty_transaction_types: EmptyTypesPolicy,
}

impl FilterSettings {
    /// Parsed `utc_offset`, `None` when date bounds go out without an offset
    pub fn offset(&self) -> Result<Option<FixedOffset>> {
        self.utc_offset
            .as_deref()
            .map(|s| {
                s.parse::<FixedOffset>()
                    .map_err(|_| ReportError::InvalidOffset(s.to_string()))
            })
            .transpose()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DocumentSettings {
    #[serde(default = "default_documents_path")]
    pub base_path: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            base_path: default_documents_path(),
        }
    }
}

fn default_documents_path() -> String {
    "/documents/".to_string()
}
