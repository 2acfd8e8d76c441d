mod settings;

pub use settings::{Config, DocumentSettings, FilterSettings, ServerSettings, SessionSettings};

use crate::error::{ReportError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.ims-report/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ims-report") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.ims-report/
    let home = std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        ReportError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".ims-report"))
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    if !config_dir.exists() {
        return Err(ReportError::ConfigNotFound(config_dir.to_path_buf()));
    }
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(ReportError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    parse_config(&content).map_err(|e| ReportError::ConfigParse { path, source: e })
}

fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[server]
base_url = "http://127.0.0.1:8000"
timeout_secs = 10          # 0 disables the timeout

[session]
# Cookie header copied from a logged-in browser session. The csrftoken
# entry is required for PDF generation.
# cookie = "csrftoken=abc123; sessionid=xyz"

[filter]
# utc_offset = "+01:00"    # appended to date_from/date_to when set
empty_transaction_types = "marker"   # or "omit"

[documents]
base_path = "/documents/"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::EmptyTypesPolicy;

    #[test]
    fn template_parses_with_defaults() {
        let config = parse_config(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.server.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.server.timeout_secs, 10);
        assert!(config.session.cookie.is_none());
        assert_eq!(config.filter.empty_transaction_types, EmptyTypesPolicy::Marker);
        assert_eq!(config.filter.offset().unwrap(), None);
        assert_eq!(config.documents.base_path, "/documents/");
    }

    #[test]
    fn empty_file_falls_back_to_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn offset_and_policy_are_read() {
        let config = parse_config(
            "[filter]\nutc_offset = \"+02:00\"\nempty_transaction_types = \"omit\"\n",
        )
        .unwrap();
        assert_eq!(config.filter.empty_transaction_types, EmptyTypesPolicy::Omit);
        let offset = config.filter.offset().unwrap().unwrap();
        assert_eq!(offset.local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn bad_offset_is_rejected() {
        let config = parse_config("[filter]\nutc_offset = \"soon\"\n").unwrap();
        assert!(matches!(
            config.filter.offset(),
            Err(ReportError::InvalidOffset(_))
        ));
    }

    #[test]
    fn missing_dir_is_reported() {
        let dir = std::env::temp_dir().join("ims-report-does-not-exist-42");
        assert!(matches!(
            load_config(&dir),
            Err(ReportError::ConfigNotFound(_))
        ));
    }
}
