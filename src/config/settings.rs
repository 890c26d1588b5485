//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.
//! Environment overrides are applied on top by [`Config::apply_env`].

use serde::Deserialize;

use crate::error::ConfigError;

/// Upstream endpoint that performs patient creation.
pub const DEFAULT_UPSTREAM_URL: &str = "http://49.50.66.74:5003/api/mcp/tools/create-patient";

/// Upstream request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Upstream clinic API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Applies environment overrides using the given lookup.
    ///
    /// Recognised variables: `PORT`, `MCP_SECRET_KEY`, `MCP_CORS_ORIGINS`,
    /// `MCP_CORS_ALLOW_CREDENTIALS` and `MCP_UPSTREAM_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is not a valid port number.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.http.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::ValidationError {
                    message: format!("PORT must be a number between 0 and 65535, got '{port}'"),
                })?;
        }

        if let Some(secret) = lookup("MCP_SECRET_KEY") {
            self.upstream.secret_key = Some(secret);
        }

        if let Some(origins) = lookup("MCP_CORS_ORIGINS") {
            self.http.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(flag) = lookup("MCP_CORS_ALLOW_CREDENTIALS") {
            self.http.cors_allow_credentials = flag.trim().eq_ignore_ascii_case("true");
        }

        if let Some(url) = lookup("MCP_UPSTREAM_URL") {
            self.upstream.url = url;
        }

        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.upstream.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                message: format!("Upstream URL '{url}' must start with http:// or https://"),
            });
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "Upstream timeout_secs must be at least 1".to_string(),
            });
        }

        for origin in &self.http.cors_origins {
            if origin != "*" && axum::http::HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::ValidationError {
                    message: format!("Invalid CORS origin '{origin}'"),
                });
            }
        }

        Ok(())
    }
}

/// Upstream clinic API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Patient creation endpoint.
    #[serde(default = "default_upstream_url")]
    pub url: String,

    /// Server-held secret key. When set, callers no longer supply one.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Request timeout in seconds, covering connect through body read.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// Returns the configured secret, treating an empty value as absent.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        self.secret_key.as_deref().filter(|s| !s.is_empty())
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            secret_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Interface to listen on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins. `*` allows any origin, an empty list none.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Whether credentialed cross-origin requests are allowed.
    #[serde(default)]
    pub cors_allow_credentials: bool,
}

impl HttpConfig {
    /// Returns true if the allow-list contains `*`.
    ///
    /// An empty list allows no origins.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            cors_allow_credentials: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
