//! Deployment configuration for siteboard
//!
//! Loaded from TOML. Resolution order for the file:
//! 1. Explicit path (command-line flag)
//! 2. `SITEBOARD_CONFIG` environment variable
//! 3. `<config_dir>/siteboard/config.toml`
//!
//! A missing default file yields defaults; a malformed file is an error.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SITEBOARD_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteboardConfig {
    /// Base URL of the product API (`/api/...` routes are resolved against it)
    pub api_base_url: String,

    /// Origin of the web app, used for checkout callbacks and chat links
    pub app_origin: String,

    /// Per-request timeout for collaborator calls
    pub request_timeout_secs: u64,

    /// External install targets opened by sync/setup
    pub install_targets: InstallTargets,

    /// Usage alert thresholds
    pub alerts: AlertThresholds,
}

impl Default for SiteboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            app_origin: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
            install_targets: InstallTargets::default(),
            alerts: AlertThresholds::default(),
        }
    }
}

/// Plugin/app URLs per integration kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallTargets {
    pub wordpress: String,
    pub shopify: String,
}

impl Default for InstallTargets {
    fn default() -> Self {
        Self {
            wordpress: "https://wordpress.org/plugins/your-plugin".to_string(),
            shopify: "https://apps.shopify.com/your-app".to_string(),
        }
    }
}

/// Usage alert thresholds, in percent of the quota ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Warning threshold percentage (0-100), defaults to 75%
    pub warning_threshold: f64,

    /// Critical threshold percentage (0-100), defaults to 90%
    pub critical_threshold: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            warning_threshold: 75.0,
            critical_threshold: 90.0,
        }
    }
}

impl SiteboardConfig {
    /// Load configuration, honoring an explicit path first
    pub fn load(explicit: Option<&Path>) -> Result<Self, CoreError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let requested = explicit.map(Path::to_path_buf).or(env_path);
        Self::resolve(requested, default_config_path())
    }

    /// A requested file must exist; the default location is optional
    fn resolve(requested: Option<PathBuf>, default: Option<PathBuf>) -> Result<Self, CoreError> {
        match requested {
            Some(path) => Self::load_from(&path),
            None => match default {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load and validate a specific file
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        let config: Self = toml::from_str(content).map_err(|e| CoreError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, url) in [
            ("api_base_url", &self.api_base_url),
            ("app_origin", &self.app_origin),
            ("install_targets.wordpress", &self.install_targets.wordpress),
            ("install_targets.shopify", &self.install_targets.shopify),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid(format!("{} must be an http(s) URL, got '{}'", name, url)));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs must be positive"));
        }

        let AlertThresholds {
            warning_threshold,
            critical_threshold,
        } = self.alerts;
        if !(warning_threshold > 0.0 && warning_threshold <= 100.0)
            || !(critical_threshold > 0.0 && critical_threshold <= 100.0)
        {
            return Err(invalid("alert thresholds must be within (0, 100]"));
        }
        if warning_threshold > critical_threshold {
            return Err(invalid("warning_threshold must not exceed critical_threshold"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// App origin without a trailing slash
    pub fn origin(&self) -> &str {
        self.app_origin.trim_end_matches('/')
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidConfig {
        message: message.into(),
    }
}

/// `<config_dir>/siteboard/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("siteboard").join("config.toml"))
}
