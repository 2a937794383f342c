//! Configuration management for the catalyst records console
//!
//! Configuration is read once at startup: an optional `catalyst.toml` (or an
//! explicit file), then `CATALYST__SECTION__KEY` environment variables.

use crate::resource::ResourceDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CATALYST";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    #[validate(nested)]
    pub api: ApiConfig,

    /// Identity provider configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extra or overriding resource descriptors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate(nested)]
    pub resources: Vec<ResourceDescriptor>,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiConfig {
    /// Base URL every request path is appended to
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,

    /// Total request timeout in seconds
    #[serde(default = "default_request_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub request_timeout: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    #[validate(range(min = 1, max = 120))]
    pub connect_timeout: u64,
}

/// Identity provider configuration
///
/// Either a pre-issued `token`, or `domain` + `client_id` + `client_secret`
/// for the client-credentials grant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Identity provider domain (`tenant.auth0.com`)
    #[serde(default)]
    pub domain: Option<String>,

    /// API audience the token is requested for
    #[serde(default)]
    pub audience: Option<String>,

    /// OAuth client id
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,

    /// Pre-issued bearer token
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_connect_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as Duration
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Connect timeout as Duration
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl AuthConfig {
    /// Whether enough is configured for the client-credentials grant
    #[must_use]
    pub const fn has_client_credentials(&self) -> bool {
        self.domain.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

impl Config {
    /// Load configuration from `catalyst.toml` (if present) and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit file (required) or the default
    /// optional `catalyst.toml`, then the environment
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        let file = path.map_or_else(
            || config::File::with_name("catalyst").required(false),
            |p| config::File::from(p).required(true),
        );

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no environment layering)
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML cannot be parsed or validated.
    pub fn from_toml(toml: &str) -> crate::Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Built-in descriptors merged with the configured ones; a configured
    /// descriptor replaces a built-in of the same name
    #[must_use]
    pub fn resource_descriptors(&self) -> Vec<ResourceDescriptor> {
        let mut descriptors = ResourceDescriptor::builtin();
        for custom in &self.resources {
            if let Some(existing) = descriptors.iter_mut().find(|d| d.name == custom.name) {
                *existing = custom.clone();
            } else {
                descriptors.push(custom.clone());
            }
        }
        descriptors
    }

    /// Look up a descriptor by name
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<ResourceDescriptor> {
        self.resource_descriptors().into_iter().find(|d| d.name == name)
    }
}
