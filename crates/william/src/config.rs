//! CLI flag layer over `william-config`.
//!
//! Core never sees these types -- it receives a pre-built `ServiceConfig`.

use std::time::Duration;

use william_config::{Config, ConfigError, Profile};
use william_core::ServiceConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use william_config::{config_path, load_config_or_default, save_config};

/// Resolve the active profile from `--profile` and the config file.
pub fn active_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    config
        .profile(global.profile.as_deref())
        .map_err(|err| match err {
            ConfigError::UnknownProfile { name } => {
                let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
                available.sort_unstable();
                CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                }
            }
            other => other.into(),
        })
}

/// Build a `ServiceConfig` from the config file, profile, and CLI overrides.
///
/// Precedence per setting: flag > environment > profile > default.
pub fn build_service_config(global: &GlobalOpts) -> Result<ServiceConfig, CliError> {
    let cfg = william_config::load_config()?;
    let (name, mut profile) = active_profile(global, &cfg)?;
    tracing::debug!(profile = %name, "resolved profile");

    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if global.proxy_identity {
        profile.require_identity = Some(false);
    }

    let mut config = william_config::profile_to_service_config(&profile, &cfg.defaults)?;

    if let Some(ref raw) = global.admin_url {
        config.admin_url = parse_url("admin-url", raw)?;
    }
    if let Some(ref raw) = global.user_url {
        config.user_url = parse_url("user-url", raw)?;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}
