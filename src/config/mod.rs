//! Configuration loading and management
//!
//! Configuration is a YAML document with four optional sections:
//!
//! ```yaml
//! server:
//!   bind_addr: "0.0.0.0:8787"
//! minter:
//!   public_origin: "https://billing.example.com"
//!   token_ttl_days: 7
//!   signing_secret: null
//! client:
//!   functions_url: "https://project.functions.example.com"
//!   payment_provider_origin: "https://pay.example.com"
//!   link_refresh_margin_secs: 60
//! backend:
//!   url: "https://project.example.com"
//!   anon_key: "public-anon-key"
//! ```
//!
//! A few values can be overridden from the environment, see
//! [`PaylinkConfig::apply_env_overrides`].

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BIND_ADDR: &str = "PAYLINK_BIND_ADDR";
pub const ENV_PUBLIC_ORIGIN: &str = "PAYLINK_PUBLIC_ORIGIN";
pub const ENV_SIGNING_SECRET: &str = "PAYLINK_SIGNING_SECRET";

/// Longest accepted token lifetime (ten years)
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Longest accepted link refresh margin (one day)
pub const MAX_LINK_REFRESH_MARGIN_SECS: i64 = 86_400;

/// Rejected configuration values
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("minter.token_ttl_days must be between 1 and {max}, got {value}")]
    TokenTtlOutOfRange { value: i64, max: i64 },

    #[error("client.link_refresh_margin_secs must be between 0 and {max}, got {value}")]
    RefreshMarginOutOfRange { value: i64, max: i64 },

    #[error("{field} must be an absolute http(s) URL, got '{value}'")]
    InvalidUrl { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".to_string(),
        }
    }
}

/// Token minter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinterConfig {
    /// Origin used for payment URLs; the request `Origin` header is used when unset
    pub public_origin: Option<String>,

    /// Token lifetime in days
    pub token_ttl_days: i64,

    /// Key for the token fingerprint; plain SHA-256 when unset
    pub signing_secret: Option<String>,
}

impl MinterConfig {
    /// Token lifetime as a duration, rejecting out-of-range values
    pub fn token_ttl(&self) -> Result<Duration, ConfigError> {
        let out_of_range = || ConfigError::TokenTtlOutOfRange {
            value: self.token_ttl_days,
            max: MAX_TOKEN_TTL_DAYS,
        };
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.token_ttl_days) {
            return Err(out_of_range());
        }
        Duration::try_days(self.token_ttl_days).ok_or_else(out_of_range)
    }
}

impl Default for MinterConfig {
    fn default() -> Self {
        Self {
            public_origin: None,
            token_ttl_days: 7,
            signing_secret: None,
        }
    }
}

/// Dashboard-side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the hosted functions (mint, email)
    pub functions_url: String,

    /// Origin the embedded payment frame posts messages from
    pub payment_provider_origin: String,

    /// Cached links expiring sooner than this are re-minted
    pub link_refresh_margin_secs: i64,

    /// Buffer size of the dashboard event bus
    pub event_capacity: usize,
}

impl ClientConfig {
    pub fn link_refresh_margin(&self) -> Result<Duration, ConfigError> {
        let out_of_range = || ConfigError::RefreshMarginOutOfRange {
            value: self.link_refresh_margin_secs,
            max: MAX_LINK_REFRESH_MARGIN_SECS,
        };
        if !(0..=MAX_LINK_REFRESH_MARGIN_SECS).contains(&self.link_refresh_margin_secs) {
            return Err(out_of_range());
        }
        Duration::try_seconds(self.link_refresh_margin_secs).ok_or_else(out_of_range)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            functions_url: "http://127.0.0.1:8787".to_string(),
            payment_provider_origin: "http://127.0.0.1:8787".to_string(),
            link_refresh_margin_secs: 60,
            event_capacity: 256,
        }
    }
}

/// Hosted backend (auth + REST store) settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaylinkConfig {
    pub server: ServerConfig,
    pub minter: MinterConfig,
    pub client: ClientConfig,
    pub backend: BackendConfig,
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        })
    }
}

impl PaylinkConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("parsing config file {}", path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Override selected values from the process environment
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override selected values from an arbitrary lookup
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.server.bind_addr = addr;
        }
        if let Some(origin) = lookup(ENV_PUBLIC_ORIGIN) {
            self.minter.public_origin = Some(origin);
        }
        if let Some(secret) = lookup(ENV_SIGNING_SECRET) {
            self.minter.signing_secret = Some(secret);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.minter.token_ttl()?;
        self.client.link_refresh_margin()?;
        if let Some(origin) = &self.minter.public_origin {
            check_url("minter.public_origin", origin)?;
        }
        check_url("client.functions_url", &self.client.functions_url)?;
        check_url(
            "client.payment_provider_origin",
            &self.client.payment_provider_origin,
        )?;
        if let Some(url) = &self.backend.url {
            check_url("backend.url", url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PaylinkConfig::default();
        assert_eq!(config.minter.token_ttl_days, 7);
        assert_eq!(config.client.link_refresh_margin_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = PaylinkConfig::from_yaml_str(
            r#"
minter:
  public_origin: "https://billing.example.com"
"#,
        )
        .unwrap();

        assert_eq!(
            config.minter.public_origin.as_deref(),
            Some("https://billing.example.com")
        );
        assert_eq!(config.minter.token_ttl_days, 7);
        assert_eq!(config.server.bind_addr, "127.0.0.1:8787");
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let err = PaylinkConfig::from_yaml_str("minter:\n  token_ttl_days: 0\n").unwrap_err();
        assert!(err.to_string().contains("token_ttl_days"));
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let mut config = PaylinkConfig::default();
        config.minter.token_ttl_days = 1_000_000_000;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TokenTtlOutOfRange {
                value: 1_000_000_000,
                max: MAX_TOKEN_TTL_DAYS,
            })
        );

        config.minter.token_ttl_days = MAX_TOKEN_TTL_DAYS;
        assert_eq!(config.minter.token_ttl(), Ok(Duration::days(MAX_TOKEN_TTL_DAYS)));
    }

    #[test]
    fn test_refresh_margin_bounds() {
        let mut config = PaylinkConfig::default();
        assert_eq!(config.client.link_refresh_margin(), Ok(Duration::seconds(60)));

        config.client.link_refresh_margin_secs = -1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RefreshMarginOutOfRange { value: -1, .. })
        ));

        config.client.link_refresh_margin_secs = i64::MAX;
        assert!(config.validate().is_err());

        config.client.link_refresh_margin_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = PaylinkConfig::default()
            .apply_overrides(|key| match key {
                ENV_PUBLIC_ORIGIN => Some("https://pay.shop.test".to_string()),
                ENV_BIND_ADDR => Some("0.0.0.0:9000".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(
            config.minter.public_origin.as_deref(),
            Some("https://pay.shop.test")
        );
        assert_eq!(config.minter.signing_secret, None);
    }

    #[test]
    fn test_invalid_origin_override() {
        let result = PaylinkConfig::default().apply_overrides(|key| {
            (key == ENV_PUBLIC_ORIGIN).then(|| "billing.example.com".to_string())
        });
        assert!(result.is_err());
    }
}
