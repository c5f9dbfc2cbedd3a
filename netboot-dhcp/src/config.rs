use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use netboot_core::config::{CLIENT_PORT, SERVER_PORT};
use netboot_core::ifup::{DEFAULT_IFUP_TIMEOUT, DEFAULT_POLL_INTERVAL};
use netboot_core::{ConfigError, ExchangeConfig, IfUpOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Effective client settings, as read from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub exchange: ExchangeSettings,
    #[serde(default)]
    pub interface: InterfaceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangeSettings {
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub local_addr: SocketAddr,
    pub remote_addr: SocketAddr,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterfaceSettings {
    pub up_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

/// Errors returned when loading a settings file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Invalid {
        path: String,
        source: ConfigError,
    },
    #[error("invalid settings in {path}: poll_interval_ms must be greater than zero")]
    ZeroPollInterval { path: String },
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        let defaults = ExchangeConfig::default();
        Self {
            read_timeout_ms: millis(defaults.read_timeout),
            write_timeout_ms: millis(defaults.write_timeout),
            local_addr: SocketAddr::from(([0, 0, 0, 0], CLIENT_PORT)),
            remote_addr: SocketAddr::from(([255, 255, 255, 255], SERVER_PORT)),
        }
    }
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self {
            up_timeout_ms: millis(DEFAULT_IFUP_TIMEOUT),
            poll_interval_ms: millis(DEFAULT_POLL_INTERVAL),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Settings {
    pub fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig {
            read_timeout: Duration::from_millis(self.exchange.read_timeout_ms),
            write_timeout: Duration::from_millis(self.exchange.write_timeout_ms),
            local_addr: Some(self.exchange.local_addr),
            remote_addr: Some(self.exchange.remote_addr),
        }
    }

    pub fn ifup_options(&self) -> IfUpOptions {
        IfUpOptions {
            timeout: Duration::from_millis(self.interface.up_timeout_ms),
            poll_interval: Duration::from_millis(self.interface.poll_interval_ms),
        }
    }

    /// Check the values the core would reject later.
    pub fn validate(&self, path: &str) -> Result<(), ConfigLoadError> {
        self.exchange_config()
            .validate()
            .map_err(|source| ConfigLoadError::Invalid {
                path: path.to_string(),
                source,
            })?;
        if self.interface.poll_interval_ms == 0 {
            return Err(ConfigLoadError::ZeroPollInterval {
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

/// Load and validate settings from a TOML file.
pub fn load_config(path: &Path) -> Result<Settings, ConfigLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_settings(&raw, path.display().to_string())
}

/// Built-in settings shipped with the binary.
pub fn default_settings() -> Settings {
    let embedded = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/netboot.toml"));
    parse_settings(embedded, "embedded config".to_string()).unwrap_or_else(|_| fallback_settings())
}

fn fallback_settings() -> Settings {
    Settings {
        exchange: ExchangeSettings::default(),
        interface: InterfaceSettings::default(),
    }
}

fn parse_settings(raw: &str, path: String) -> Result<Settings, ConfigLoadError> {
    let settings: Settings = toml::from_str(raw).map_err(|source| ConfigLoadError::Parse {
        path: path.clone(),
        source,
    })?;
    settings.validate(&path)?;
    Ok(settings)
}
