// src/config.rs

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::{get_config_dir, get_data_dir};

const CONFIG_FILE: &str = "settings.toml";
const HISTORY_FILE: &str = "history.jsonl";

/// Network probe limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Total budget for the accessibility request, redirects included.
    pub http_timeout_secs: u64,
    /// Connect and handshake timeout for the TLS probe.
    pub tls_timeout_secs: u64,
    /// Retry an unreachable `https` URL once over plain `http`.
    pub http_fallback: bool,
    pub user_agent: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            http_timeout_secs: 10,
            tls_timeout_secs: 10,
            http_fallback: false,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Domain registration lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhoisSettings {
    /// Hard ceiling on a whole lookup, referrals included.
    pub deadline_secs: u64,
    /// Per-connection read/write timeout.
    pub io_timeout_secs: u64,
    /// Query this server for every domain instead of the registry table.
    pub server: Option<String>,
}

impl Default for WhoisSettings {
    fn default() -> Self {
        Self { deadline_secs: 6, io_timeout_secs: 5, server: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub enabled: bool,
    /// Defaults to `history.jsonl` in the data directory.
    pub file: Option<PathBuf>,
    pub recent_limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { enabled: true, file: None, recent_limit: 10 }
    }
}

/// Global configuration loaded from `settings.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub probes: ProbeSettings,
    pub whois: WhoisSettings,
    pub history: HistorySettings,
}

impl Settings {
    pub fn history_file(&self) -> PathBuf {
        self.history
            .file
            .clone()
            .unwrap_or_else(|| get_data_dir().join(HISTORY_FILE))
    }
}

pub fn config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}

/// Load configuration from the default location, creating it if none exists.
pub fn load_or_init() -> Result<Settings> {
    load_or_init_at(&config_path())
}

/// Load configuration from `path`, writing the defaults there first if the file is missing.
pub fn load_or_init_at(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let defaults = Settings::default();
        let toml = toml::to_string_pretty(&defaults)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("creating config directory {}", parent.display()))?;
        }
        fs::write(path, toml).wrap_err_with(|| format!("writing default config to {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(defaults);
    }

    load_from(path)
}

/// Load configuration from an explicit file. The file must exist.
pub fn load_from(path: &Path) -> Result<Settings> {
    let data = fs::read_to_string(path).wrap_err_with(|| format!("reading config {}", path.display()))?;
    let settings: Settings =
        toml::from_str(&data).wrap_err_with(|| format!("parsing config {}", path.display()))?;
    tracing::debug!(?settings, "Configuration loaded.");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_values() {
        let settings = Settings::default();
        assert_eq!(settings.probes.http_timeout_secs, 10);
        assert_eq!(settings.probes.tls_timeout_secs, 10);
        assert!(!settings.probes.http_fallback);
        assert_eq!(settings.whois.deadline_secs, 6);
        assert_eq!(settings.whois.io_timeout_secs, 5);
        assert!(settings.whois.server.is_none());
        assert!(settings.history.enabled);
        assert_eq!(settings.history.recent_limit, 10);
    }

    #[test]
    fn settings_toml_roundtrip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml = r#"
            [probes]
            http_fallback = true

            [whois]
            server = "whois.example.net"
        "#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert!(settings.probes.http_fallback);
        assert_eq!(settings.probes.http_timeout_secs, 10);
        assert_eq!(settings.whois.server.as_deref(), Some("whois.example.net"));
        assert_eq!(settings.whois.deadline_secs, 6);
        assert_eq!(settings.history, HistorySettings::default());
    }

    #[test]
    fn load_or_init_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("settings.toml");

        let created = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, Settings::default());

        fs::write(&path, "[history]\nenabled = false\n").unwrap();
        let reloaded = load_or_init_at(&path).unwrap();
        assert!(!reloaded.history.enabled);
    }

    #[test]
    fn explicit_history_file_wins() {
        let mut settings = Settings::default();
        settings.history.file = Some(PathBuf::from("/tmp/scans.jsonl"));
        assert_eq!(settings.history_file(), PathBuf::from("/tmp/scans.jsonl"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[probes\nhttp_timeout_secs = ").unwrap();
        assert!(load_from(&path).is_err());
    }
}
