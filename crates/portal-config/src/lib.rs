use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PORTAL_CONFIG: &str = "PORTAL_CONFIG";
pub const ENV_PORTAL_API_BASE_URL: &str = "PORTAL_API_BASE_URL";
pub const ENV_PORTAL_ADMIN_EMAIL: &str = "PORTAL_ADMIN_EMAIL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortalConfig {
    #[serde(default)]
    pub api: ApiConfigToml,
    #[serde(default)]
    pub access: AccessConfigToml,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfigToml {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfigToml {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Access settings. `admin_email` only picks the landing page for that
/// account; leaving it empty disables the admin redirect entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AccessConfigToml {
    #[serde(default)]
    pub admin_email: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api: ApiConfigToml::default(),
            access: AccessConfigToml::default(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_owned()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

pub fn load_from_env() -> Result<PortalConfig, ConfigError> {
    let path = config_path_from_env()?;
    let mut config = load_or_create_config(&path)?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PortalConfig, ConfigError> {
    load_or_create_config(path.as_ref())
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = resolve_home_dir().ok_or_else(|| {
        ConfigError::configuration("Unable to resolve home directory from HOME or USERPROFILE")
    })?;

    Ok(home
        .join(".config")
        .join("billing-portal")
        .join("config.toml"))
}

fn config_path_from_env() -> Result<PathBuf, ConfigError> {
    match std::env::var(ENV_PORTAL_CONFIG) {
        Ok(raw) => {
            if raw.trim().is_empty() {
                default_config_path()
            } else {
                Ok(raw.into())
            }
        }
        Err(std::env::VarError::NotPresent) => default_config_path(),
        Err(_) => Err(ConfigError::configuration(
            "PORTAL_CONFIG contained invalid UTF-8",
        )),
    }
}

fn resolve_home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("USERPROFILE")
                .ok()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
}

fn apply_env_overrides(config: &mut PortalConfig) -> Result<(), ConfigError> {
    if let Ok(raw) = std::env::var(ENV_PORTAL_API_BASE_URL) {
        if !raw.trim().is_empty() {
            config.api.base_url = raw;
        }
    }
    if let Ok(raw) = std::env::var(ENV_PORTAL_ADMIN_EMAIL) {
        config.access.admin_email = raw;
    }
    normalize_config(config).map(|_| ())
}

fn persist_config(path: &Path, config: &PortalConfig) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(config).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to serialize PORTAL_CONFIG for {}: {err}",
            path.display()
        ))
    })?;

    std::fs::write(path, rendered.as_bytes()).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to write PORTAL_CONFIG to {}: {err}",
            path.display()
        ))
    })
}

fn load_or_create_config(path: &Path) -> Result<PortalConfig, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|err| {
                        ConfigError::configuration(format!(
                            "Failed to create parent directory {} for PORTAL_CONFIG: {err}",
                            parent.display()
                        ))
                    })?;
                }
            }

            let default_config = PortalConfig::default();
            persist_config(path, &default_config)?;

            toml::to_string_pretty(&default_config).map_err(|err| {
                ConfigError::configuration(format!(
                    "Failed to serialize default PORTAL_CONFIG: {err}"
                ))
            })?
        }
        Err(err) => {
            return Err(ConfigError::configuration(format!(
                "Failed to read PORTAL_CONFIG from {}: {err}",
                path.display()
            )));
        }
    };

    let mut config: PortalConfig = toml::from_str(&raw).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to parse PORTAL_CONFIG from {}: {err}",
            path.display()
        ))
    })?;

    let changed = normalize_config(&mut config)?;
    if changed {
        persist_config(path, &config)?;
    }

    Ok(config)
}

fn normalize_config(config: &mut PortalConfig) -> Result<bool, ConfigError> {
    let mut changed = false;

    let trimmed_base_url = config.api.base_url.trim().trim_end_matches('/').to_owned();
    if trimmed_base_url.is_empty() {
        config.api.base_url = default_api_base_url();
        changed = true;
    } else if trimmed_base_url != config.api.base_url {
        config.api.base_url = trimmed_base_url;
        changed = true;
    }
    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://") {
        return Err(ConfigError::configuration(format!(
            "Invalid `api.base_url` value '{}' in PORTAL_CONFIG: expected an http(s) URL.",
            config.api.base_url
        )));
    }

    let normalized_timeout = if config.api.request_timeout_secs == 0 {
        default_request_timeout_secs()
    } else {
        config.api.request_timeout_secs.clamp(1, 120)
    };
    if normalized_timeout != config.api.request_timeout_secs {
        config.api.request_timeout_secs = normalized_timeout;
        changed = true;
    }

    let trimmed_admin = config.access.admin_email.trim().to_owned();
    if trimmed_admin != config.access.admin_email {
        config.access.admin_email = trimmed_admin;
        changed = true;
    }

    Ok(changed)
}
