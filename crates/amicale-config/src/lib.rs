//! Configuration for the campus-services data layer.
//!
//! TOML file + environment overrides, resolved through figment, and
//! translation into `amicale_api` transport and session wiring. Host
//! applications load one `Config` at startup and build their
//! `SessionManager` from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use amicale_api::{ApiClient, KeyringStore, SessionManager, TransportConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to build HTTP client: {0}")]
    Transport(#[from] amicale_api::transport::TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub refresh: RefreshSection,

    #[serde(default)]
    pub storage: StorageSection,
}

/// `[api]` -- endpoint and transport settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct ApiSection {
    /// API endpoint root; request paths are joined onto it.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Override the User-Agent header. Defaults to the versioned
    /// client identifier.
    pub user_agent: Option<String>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

fn default_endpoint() -> String {
    amicale_api::transport::DEFAULT_ENDPOINT.into()
}
fn default_timeout() -> u64 {
    30
}

/// `[refresh]` -- lifecycle timing knobs.
#[derive(Debug, Deserialize, Serialize)]
pub struct RefreshSection {
    /// Minimum seconds between two dispatches of the same request.
    #[serde(default = "default_throttle")]
    pub throttle_secs: u64,

    /// Auto-refresh period for screens that opt in, in seconds.
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh_secs: u64,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            throttle_secs: default_throttle(),
            auto_refresh_secs: default_auto_refresh(),
        }
    }
}

fn default_throttle() -> u64 {
    3
}
fn default_auto_refresh() -> u64 {
    60
}

/// `[storage]` -- secure credential storage settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct StorageSection {
    /// Keyring service identifier under which the session token lives.
    #[serde(default = "default_service")]
    pub service: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            service: default_service(),
        }
    }
}

fn default_service() -> String {
    amicale_api::credentials::DEFAULT_SERVICE.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("fr", "amicale-insat", "amicale").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("amicale");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_at(&config_path())
}

/// Load the full Config from a specific file + environment.
pub fn load_config_at(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AMICALE_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning the defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_at(cfg, &config_path())
}

/// Serialize config to TOML and write it to a specific path.
pub fn save_config_at(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Wiring ──────────────────────────────────────────────────────────

/// Translate the `[api]` section into a transport config.
pub fn transport_config(cfg: &Config) -> Result<TransportConfig, ConfigError> {
    let base_url: url::Url = cfg
        .api
        .endpoint
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api.endpoint".into(),
            reason: format!("invalid URL: {}", cfg.api.endpoint),
        })?;

    let mut transport = TransportConfig::new(base_url);
    transport.timeout = Duration::from_secs(cfg.api.timeout_secs);
    if let Some(ref ua) = cfg.api.user_agent {
        transport.user_agent = ua.clone();
    }
    Ok(transport)
}

/// The minimum interval between refresh dispatches, per config.
pub fn throttle_interval(cfg: &Config) -> Duration {
    Duration::from_secs(cfg.refresh.throttle_secs)
}

/// The auto-refresh period for screens that opt in, per config.
pub fn auto_refresh_interval(cfg: &Config) -> Duration {
    Duration::from_secs(cfg.refresh.auto_refresh_secs)
}

/// Build a ready-to-use session from the config: envelope client over
/// the configured endpoint, token persisted in the platform keyring.
pub fn build_session(cfg: &Config) -> Result<SessionManager, ConfigError> {
    let client = ApiClient::new(&transport_config(cfg)?)?;
    let store = Arc::new(KeyringStore::new(cfg.storage.service.clone()));
    Ok(SessionManager::new(client, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_production_endpoint() {
        let cfg = Config::default();
        assert_eq!(cfg.api.endpoint, "https://www.amicale-insat.fr/api/");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.refresh.throttle_secs, 3);
        assert_eq!(cfg.storage.service, "amicale");
    }

    #[test]
    fn invalid_endpoint_is_a_validation_error() {
        let mut cfg = Config::default();
        cfg.api.endpoint = "not a url".into();
        let err = transport_config(&cfg).expect_err("should reject");
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn transport_carries_overrides() {
        let mut cfg = Config::default();
        cfg.api.timeout_secs = 5;
        cfg.api.user_agent = Some("campus-test/0".into());
        let transport = transport_config(&cfg).expect("transport");
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert_eq!(transport.user_agent, "campus-test/0");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.refresh.auto_refresh_secs = 120;
        save_config_at(&cfg, &path).expect("save");

        let loaded = load_config_at(&path).expect("load");
        assert_eq!(loaded.refresh.auto_refresh_secs, 120);
        assert_eq!(loaded.api.endpoint, cfg.api.endpoint);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let cfg = load_config_at(Path::new("/nonexistent/config.toml")).expect("load");
        assert_eq!(cfg.refresh.throttle_secs, 3);
    }
}
