//! Configuration loader with file and environment variable support

use crate::{ConfigError, PortalConfig};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "fidelicard.toml",
    "config.toml",
    "./config/fidelicard.toml",
    "./config/config.toml",
    "/etc/fidelicard/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<PortalConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an injectable variable lookup.
    pub fn load_with<F>(&self, lookup: F) -> Result<PortalConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = PortalConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = PortalConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup);

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Some(path) = lookup("FIDELICARD_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_overrides<F>(config: &mut PortalConfig, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    // Backend
    if let Some(val) = lookup("FIDELICARD_BACKEND_URL") {
        config.backend.url = val;
    }
    if let Some(val) = lookup("FIDELICARD_BACKEND_ANON_KEY") {
        config.backend.anon_key = val;
    }
    if let Some(val) = lookup("FIDELICARD_BACKEND_SERVICE_ROLE_KEY") {
        config.backend.service_role_key = val;
    }
    if let Some(val) = lookup("FIDELICARD_BACKEND_TIMEOUT_SECS") {
        if let Ok(secs) = val.parse() {
            config.backend.timeout_secs = secs;
        }
    }
    if let Some(val) = lookup("FIDELICARD_AUTO_REFRESH_MARGIN_SECS") {
        if let Ok(secs) = val.parse() {
            config.backend.auto_refresh_margin_secs = secs;
        }
    }
    if let Some(val) = lookup("FIDELICARD_SESSION_FILE") {
        config.backend.session_file = val;
    }

    // Site
    if let Some(val) = lookup("FIDELICARD_SITE_URL") {
        config.site.site_url = val;
    }
    if let Some(val) = lookup("FIDELICARD_PASSWORD_CHANGE_PATH") {
        config.site.password_change_path = val;
    }

    // Support
    if let Some(val) = lookup("FIDELICARD_SUPPORT_EMAIL") {
        config.support.email = val;
    }
}
