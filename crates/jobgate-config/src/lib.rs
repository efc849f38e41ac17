#![deny(unsafe_code)]

//! Configuration loading and validation for jobgate.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure and
//! derives the [`FeatureSettings`] that decide whether the feature endpoints
//! exist at all.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Which daemon-facing subsystems are switched on.
    #[serde(default)]
    pub daemons: DaemonsConfig,

    /// Credentials guarding the feature endpoints.
    #[serde(default)]
    pub feature: FeatureConfig,
}

/// Configuration for the HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Port the server binds to.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    9200
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "jobgate_core=trace").
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
    "info".to_string()
}

/// The `[daemons]` section.
///
/// ## TOML Example
///
/// ```toml
/// [daemons]
/// feature = true
///
/// [[daemons.roster]]
/// identifier = "feature-1"
/// status = "idle"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonsConfig {
    /// Whether the feature daemon endpoints are registered.
    #[serde(default)]
    pub feature: bool,

    /// Capacity of the queue accepted jobs wait in for the execution backend.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// Daemons reported by `GET /feature`.
    #[serde(default)]
    pub roster: Vec<RosterEntryConfig>,
}

impl Default for DaemonsConfig {
    fn default() -> Self {
        Self {
            feature: false,
            bus_capacity: default_bus_capacity(),
            roster: Vec::new(),
        }
    }
}

fn default_bus_capacity() -> usize {
    256
}

/// A single daemon in the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntryConfig {
    /// Daemon identifier, used as `daemonTarget` when scheduling.
    pub identifier: String,

    /// Reported status: "idle", "busy" or "offline".
    #[serde(default = "default_roster_status")]
    pub status: String,
}

fn default_roster_status() -> String {
    "idle".to_string()
}

/// The `[feature]` section: the Basic-Auth pair for both feature routes.
///
/// The password is wiped from memory when the config is dropped.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub pass: Zeroizing<String>,
}

impl fmt::Debug for FeatureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureConfig")
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}

/// Settings consumed by the feature endpoint registrar.
///
/// Only produced by [`AppConfig::feature_settings`] when the feature is
/// switched on; immutable for the lifetime of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct FeatureSettings {
    pub enabled: bool,
    pub user: String,
    pub pass: Zeroizing<String>,
}

impl FeatureSettings {
    /// Enabled settings guarded by the given credential pair.
    pub fn enabled(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            enabled: true,
            user: user.into(),
            pass: Zeroizing::new(pass.into()),
        }
    }

    /// Settings that keep the feature endpoints unregistered.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            user: String::new(),
            pass: Zeroizing::default(),
        }
    }
}

impl fmt::Debug for FeatureSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureSettings")
            .field("enabled", &self.enabled)
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}

/// Accepted values for `daemons.roster[].status`.
pub const ROSTER_STATUSES: [&str; 3] = ["idle", "busy", "offline"];

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen_port == 0 {
            return Err(ConfigError::Validation(
                "server.listen_port must be non-zero".to_string(),
            ));
        }
        if self.server.listen_addr.is_empty() {
            return Err(ConfigError::Validation(
                "server.listen_addr must not be empty".to_string(),
            ));
        }
        if self.daemons.bus_capacity == 0 {
            return Err(ConfigError::Validation(
                "daemons.bus_capacity must be at least 1".to_string(),
            ));
        }

        for (i, entry) in self.daemons.roster.iter().enumerate() {
            if entry.identifier.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "daemons.roster[{i}].identifier must not be empty"
                )));
            }
            if !ROSTER_STATUSES.contains(&entry.status.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "daemons.roster[{i}].status must be one of {:?}, got {:?}",
                    ROSTER_STATUSES, entry.status
                )));
            }
        }

        // The user half of the pair is the lookup key; a blank one would
        // let any empty Basic header through.
        if self.daemons.feature && self.feature.user.is_empty() {
            return Err(ConfigError::Validation(
                "feature.user is required when daemons.feature is enabled".to_string(),
            ));
        }
        if self.feature.user.contains(':') {
            return Err(ConfigError::Validation(
                "feature.user must not contain ':'".to_string(),
            ));
        }

        Ok(())
    }

    /// Settings for the feature endpoint registrar.
    ///
    /// `None` when `daemons.feature` is absent or false: the feature routes
    /// must then not be registered at all.
    pub fn feature_settings(&self) -> Option<FeatureSettings> {
        if !self.daemons.feature {
            return None;
        }
        Some(FeatureSettings {
            enabled: true,
            user: self.feature.user.clone(),
            pass: self.feature.pass.clone(),
        })
    }
}
