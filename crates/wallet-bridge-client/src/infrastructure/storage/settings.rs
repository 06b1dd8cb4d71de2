//! TOML settings file for the `wallet-bridge` CLI.
//!
//! Default location:
//! - Windows:  `%APPDATA%\WalletBridge\settings.toml`
//! - Linux:    `~/.config/wallet-bridge/settings.toml`
//! - macOS:    `~/Library/Application Support/WalletBridge/settings.toml`
//!
//! ```toml
//! [backend]
//! host = "127.0.0.1"
//! port = 8082
//! tls = false
//! token = "0123abcd"
//!
//! [client]
//! request_timeout_secs = 30
//! log_level = "info"
//! ```
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! `request_timeout_secs = 0` disables the request timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT};
use crate::domain::ClientConfig;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Settings schema ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub client: ClientSettings,
}

/// Where the backend listens and how to authenticate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub tls: bool,
    /// API token.  Omitted for a backend in development mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSettings {
    /// Seconds before an unanswered request fails.  `0` waits forever.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: false,
            token: None,
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// The [`ClientConfig`] these settings describe.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            host: self.backend.host.clone(),
            port: self.backend.port,
            tls: self.backend.tls,
            token: self.backend.token.clone(),
            request_timeout: match self.client.request_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

// ── Load / save ───────────────────────────────────────────────────────────────

/// Full path of the settings file in the platform config directory.
///
/// # Errors
///
/// [`SettingsError::NoPlatformConfigDir`] when neither the platform variable
/// nor `HOME` is set.
pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    platform_config_dir()
        .map(|dir| dir.join("settings.toml"))
        .ok_or(SettingsError::NoPlatformConfigDir)
}

/// Loads settings from `path`, returning the defaults if the file does not
/// exist.
///
/// # Errors
///
/// [`SettingsError::Io`] for file-system errors other than "not found", and
/// [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `settings` to `path`, creating the parent directory if needed.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("WalletBridge"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("wallet-bridge"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("WalletBridge")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wallet_bridge_{name}_{}", std::process::id()))
    }

    #[test]
    fn test_default_settings_match_client_config_default() {
        // Arrange / Act
        let cfg = Settings::default().to_client_config();

        // Assert
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_zero_timeout_disables_request_timeout() {
        let mut settings = Settings::default();
        settings.client.request_timeout_secs = 0;

        assert_eq!(settings.to_client_config().request_timeout, None);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[backend]
port = 9000
token = "abc"
"#;

        // Act
        let settings: Settings = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(settings.backend.port, 9000);
        assert_eq!(settings.backend.host, "127.0.0.1");
        assert_eq!(settings.backend.token.as_deref(), Some("abc"));
        assert_eq!(settings.client.log_level, "info");
    }

    #[test]
    fn test_empty_token_is_omitted_from_toml() {
        let toml_str = toml::to_string_pretty(&Settings::default()).expect("serialize");

        assert!(!toml_str.contains("token"), "None token must be omitted");
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let dir = scratch_dir("invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_settings(&path);

        assert!(matches!(result, Err(SettingsError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_settings_returns_default_when_file_absent() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/settings.toml");

        let settings = load_settings(&path).expect("missing file is not an error");

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        // Arrange
        let dir = scratch_dir("round_trip");
        let path = dir.join("nested").join("settings.toml");
        let mut settings = Settings::default();
        settings.backend.tls = true;
        settings.client.log_level = "debug".to_string();

        // Act
        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();

        // Assert
        assert_eq!(loaded, settings);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_default_settings_path_ends_with_settings_toml() {
        if let Ok(path) = default_settings_path() {
            assert!(path.ends_with("settings.toml"), "got {path:?}");
        }
    }
}
