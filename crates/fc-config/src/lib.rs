//! FideliCard Portal Configuration
//!
//! TOML-based configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root portal configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub backend: BackendConfig,
    pub site: SiteConfig,
    pub support: SupportConfig,
}

/// Hosted backend (identity + relational API) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public key sent as `apikey` on every request
    pub anon_key: String,
    /// Privileged key for account administration; empty disables admin calls
    pub service_role_key: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Refresh the access token this many seconds before it expires
    pub auto_refresh_margin_secs: u64,
    /// File the signed-in session is persisted to; empty keeps it in memory
    pub session_file: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            service_role_key: String::new(),
            timeout_secs: 30,
            auto_refresh_margin_secs: 60,
            session_file: String::new(),
        }
    }
}

/// Public site settings used to build redirect links
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin the portal is served from
    pub site_url: String,
    pub login_path: String,
    pub password_change_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:5173".to_string(),
            login_path: "/login".to_string(),
            password_change_path: "/alterar-senha".to_string(),
        }
    }
}

impl SiteConfig {
    /// Redirect target embedded in password-recovery e-mails.
    pub fn password_change_url(&self) -> String {
        format!(
            "{}{}",
            self.site_url.trim_end_matches('/'),
            self.password_change_path
        )
    }
}

/// Contact shown on blocking screens (inactive or missing company)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    pub email: String,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            email: "suporte@fidelicard.com.br".to_string(),
        }
    }
}

impl PortalConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PortalConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check the settings every deployment needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.url.is_empty() {
            return Err(ConfigError::ValidationError("backend.url is required".to_string()));
        }
        if !self.backend.url.starts_with("http://") && !self.backend.url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "backend.url must be an http(s) URL, got {}",
                self.backend.url
            )));
        }
        if self.backend.anon_key.is_empty() {
            return Err(ConfigError::ValidationError("backend.anon_key is required".to_string()));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !self.site.password_change_path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "site.password_change_path must start with '/'".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# FideliCard Portal Configuration
# Environment variables (FIDELICARD_*) override these settings

[backend]
url = "https://your-project.supabase.co"
anon_key = ""
service_role_key = ""
timeout_secs = 30
auto_refresh_margin_secs = 60
session_file = ""

[site]
site_url = "http://localhost:5173"
login_path = "/login"
password_change_path = "/alterar-senha"

[support]
email = "suporte@fidelicard.com.br"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_parses() {
        let config: PortalConfig = toml::from_str(&PortalConfig::example_toml()).unwrap();
        assert_eq!(config.backend.url, "https://your-project.supabase.co");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.site.password_change_path, "/alterar-senha");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PortalConfig = toml::from_str(
            r#"
[backend]
url = "https://abc.supabase.co"
"#,
        )
        .unwrap();
        assert_eq!(config.backend.auto_refresh_margin_secs, 60);
        assert_eq!(config.support.email, "suporte@fidelicard.com.br");
        assert_eq!(config.site.login_path, "/login");
    }

    #[test]
    fn test_password_change_url() {
        let mut site = SiteConfig::default();
        site.site_url = "https://fidelicard.com.br/".to_string();
        assert_eq!(site.password_change_url(), "https://fidelicard.com.br/alterar-senha");
    }

    #[test]
    fn test_validate() {
        let mut config = PortalConfig::default();
        assert!(config.validate().is_err());

        config.backend.url = "abc.supabase.co".to_string();
        config.backend.anon_key = "anon".to_string();
        assert!(config.validate().is_err());

        config.backend.url = "https://abc.supabase.co".to_string();
        assert!(config.validate().is_ok());

        config.backend.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
