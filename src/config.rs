//! Configuration management for ssh-relay.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::Args;

/// Parameters for one SSH connection.
///
/// Built fresh per invocation; the private key is addressed by path and
/// re-read from storage on every execution, so rotating the key on disk
/// takes effect on the next call without a restart.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Target host.
    pub host: String,
    /// Target port.
    pub port: u16,
    /// Username to authenticate as.
    pub username: String,
    /// Path to the private key file.
    pub private_key_path: PathBuf,
    /// Connect/handshake timeout in seconds.
    pub connect_timeout_secs: u64,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection settings.
    pub connection: ConnectionSection,
    /// Return-code policy settings.
    pub policy: PolicySection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Connection configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    /// Remote host to connect to.
    pub host: String,
    /// SSH port.
    pub port: u16,
    /// Username.
    pub username: String,
    /// Private key file path.
    pub private_key: PathBuf,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            private_key: PathBuf::new(),
            connect_timeout_secs: 30,
        }
    }
}

/// Return-code policy section.
///
/// The adapter always reports raw exit codes; this threshold only
/// drives the binary's own success/failure classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySection {
    /// Lowest exit code treated as an error.
    pub min_error: u32,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self { min_error: 1 }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SSH_RELAY_HOST") {
            self.connection.host = host;
        }

        if let Ok(port) = std::env::var("SSH_RELAY_PORT") {
            if let Ok(port) = port.parse() {
                self.connection.port = port;
            }
        }

        if let Ok(user) = std::env::var("SSH_RELAY_USER") {
            self.connection.username = user;
        }

        if let Ok(key) = std::env::var("SSH_RELAY_KEY") {
            if !key.is_empty() {
                self.connection.private_key = PathBuf::from(key);
            }
        }

        if let Ok(level) = std::env::var("SSH_RELAY_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref host) = args.host {
            self.connection.host = host.clone();
        }

        if let Some(port) = args.port {
            self.connection.port = port;
        }

        if let Some(ref user) = args.username {
            self.connection.username = user.clone();
        }

        if let Some(ref key) = args.key {
            self.connection.private_key = key.clone();
        }

        if let Some(min_error) = args.min_error {
            self.policy.min_error = min_error;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Build per-invocation connection parameters.
    pub fn to_connection_params(&self) -> Result<ConnectionParams, ConfigError> {
        if self.connection.host.is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        if self.connection.username.is_empty() {
            return Err(ConfigError::Missing("username"));
        }
        if self.connection.private_key.as_os_str().is_empty() {
            return Err(ConfigError::Missing("private key"));
        }

        Ok(ConnectionParams {
            host: self.connection.host.clone(),
            port: self.connection.port,
            username: self.connection.username.clone(),
            private_key_path: self.connection.private_key.clone(),
            connect_timeout_secs: self.connection.connect_timeout_secs,
        })
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Required setting not provided by any source.
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::Missing(name) => write!(f, "missing required setting: {}", name),
        }
    }
}

impl std::error::Error for ConfigError {}
