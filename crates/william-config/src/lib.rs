//! Shared configuration for the William tools.
//!
//! TOML profiles loaded through `figment` (built-in defaults, then the
//! config file, then `WILLIAM_*` environment variables) and translation
//! into `william_core::ServiceConfig`. The CLI layers its flags on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use william_api::{DEFAULT_ADMIN_BASE_URL, DEFAULT_USER_BASE_URL};
use william_core::ServiceConfig;

/// Overrides the admin service base URL.
pub const ADMIN_URL_ENV: &str = "WILLIAM_ADMIN_API_BASE_URL";
/// Overrides the public service base URL.
pub const USER_URL_ENV: &str = "WILLIAM_API_BASE_URL";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

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
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile called `name`, or the default profile when `None`.
    ///
    /// A missing default profile yields an empty one so a bare install
    /// talks to the local services.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        if let Some(name) = name {
            return self
                .profiles
                .get(name)
                .cloned()
                .map(|p| (name.to_owned(), p))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() });
        }
        let name = self.default_profile.as_deref().unwrap_or("default");
        let profile = self.profiles.get(name).cloned().unwrap_or_default();
        Ok((name.to_owned(), profile))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named pair of service endpoints plus the caller's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Admin service base URL (e.g. "http://localhost:8081/api").
    pub admin_url: Option<String>,

    /// Public service base URL (e.g. "http://localhost:8080").
    pub user_url: Option<String>,

    /// Email sent as `X-Email` on public-service calls.
    pub email: Option<String>,

    /// Refuse per-user calls without an email. Defaults to `true`.
    pub require_identity: Option<bool>,

    /// Override timeout, seconds.
    pub timeout: Option<u64>,

    /// Firewall rules refresh period, seconds.
    pub firewall_poll: Option<u64>,

    /// Admin peer stats refresh period, seconds.
    pub peer_stats_poll: Option<u64>,

    /// End-user peer status refresh period, seconds.
    pub peer_status_poll: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "william", "william").map_or_else(
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
    p.push("william");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file is not an error.
///
/// Nested keys come from the environment with `__` separators, e.g.
/// `WILLIAM_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WILLIAM_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Environment variable, else profile value, else built-in default.
fn pick_url(
    field: &str,
    env_value: Option<String>,
    profile_value: Option<&str>,
    default: &str,
) -> Result<Url, ConfigError> {
    let env_value = env_value.filter(|v| !v.trim().is_empty());
    let raw = env_value.as_deref().or(profile_value).unwrap_or(default);
    parse_url(field, raw)
}

/// Build a `ServiceConfig` from a profile, reading URL overrides from the
/// process environment.
pub fn profile_to_service_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ServiceConfig, ConfigError> {
    profile_to_service_config_with(profile, defaults, |name| std::env::var(name).ok())
}

/// Like [`profile_to_service_config`] with an explicit environment lookup.
pub fn profile_to_service_config_with(
    profile: &Profile,
    defaults: &Defaults,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ServiceConfig, ConfigError> {
    let admin_url = pick_url(
        "admin_url",
        env(ADMIN_URL_ENV),
        profile.admin_url.as_deref(),
        DEFAULT_ADMIN_BASE_URL,
    )?;
    let user_url = pick_url(
        "user_url",
        env(USER_URL_ENV),
        profile.user_url.as_deref(),
        DEFAULT_USER_BASE_URL,
    )?;

    let mut config = ServiceConfig::new(admin_url, user_url);
    config.email = profile
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_owned);
    config.require_identity = profile.require_identity.unwrap_or(true);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    if let Some(secs) = profile.firewall_poll {
        config.firewall_poll = poll_interval("firewall_poll", secs)?;
    }
    if let Some(secs) = profile.peer_stats_poll {
        config.peer_stats_poll = poll_interval("peer_stats_poll", secs)?;
    }
    if let Some(secs) = profile.peer_status_poll {
        config.peer_status_poll = poll_interval("peer_status_poll", secs)?;
    }
    Ok(config)
}

fn poll_interval(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
