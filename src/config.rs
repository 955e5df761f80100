use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::{BulwarkError, Result};
use crate::security::{SecurityConfig, SecurityHeaders};
use crate::utils::{get_env_flag, get_env_with_prefix};

/// Main configuration for a Bulwark application
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable support
///
/// Errors found while reading the environment are held until
/// [`ConfigBuilder::build`], so the builder chain stays fluent.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
    error: Option<BulwarkError>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            error: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.config.security = security;
        self
    }

    /// Resolve the security section from option key/value pairs
    ///
    /// See [`SecurityConfig::from_params`] for the accepted keys.
    pub fn with_security_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        match SecurityConfig::from_params(params) {
            Ok(security) => self.config.security = security,
            Err(e) => self.record_error(e.into()),
        }
        self
    }

    /// Load configuration from environment variables with BULWARK_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        // BULWARK_PORT first, then PORT as set by most hosting platforms
        if let Some(port) = get_env_with_prefix("PORT") {
            match port.parse() {
                Ok(p) => self.config.server.port = p,
                Err(_) => self.record_error(BulwarkError::bad_request(format!(
                    "Invalid port: {}",
                    port
                ))),
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_flag("LOG_JSON") {
            self.config.logging.json = json;
        }

        match SecurityConfig::from_env() {
            Ok(security) => self.config.security = security,
            Err(e) => self.record_error(e.into()),
        }

        self
    }

    // The first error is the one reported
    fn record_error(&mut self, error: BulwarkError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - An environment variable or security option that failed to parse
    /// - Invalid server address (host:port) or port 0
    /// - Invalid log level
    /// - Security header values that cannot be composed
    pub fn build(self) -> Result<Config> {
        if let Some(error) = self.error {
            return Err(error);
        }

        self.config.server.addr().map_err(|e| {
            BulwarkError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(BulwarkError::bad_request("Server port must be greater than 0"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(BulwarkError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        // Surface header composition failures at startup, not per request
        SecurityHeaders::new(&self.config.security)?;

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
