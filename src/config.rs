use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;
use log::debug;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::time_format::LabelStyle;
use crate::utils::normalize_url;

/// Environment variable that overrides `base_url` from the settings file.
pub const BACKEND_URL_ENV: &str = "CHATSYNC_BACKEND_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Render list timestamps as "5m ago" instead of "5m".
    pub relative_suffix: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            relative_suffix: false,
        }
    }
}

impl Settings {
    /// `<config dir>/chatsync.toml`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let base = BaseDirs::new().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.config_dir().join("chatsync.toml"))
    }

    /// Read the settings file if there is one, then apply the environment
    /// override. A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self, ConfigError> {
        let from_file = match Self::config_path() {
            Ok(path) if path.exists() => {
                debug!("reading settings from {}", path.display());
                Self::from_toml_str(&fs::read_to_string(&path)?)?
            }
            _ => Self::default(),
        };
        Ok(from_file.with_env_override(std::env::var(BACKEND_URL_ENV).ok()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_env_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        self
    }

    /// The normalized endpoint to hand to the API client.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        Ok(normalize_url(&self.base_url))
    }

    /// Per-request timeout. Zero would fail every request, so it reads as
    /// the default.
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    pub fn label_style(&self) -> LabelStyle {
        LabelStyle {
            suffix: self.relative_suffix,
        }
    }
}
