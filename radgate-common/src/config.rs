//! Configuration file loading.
//!
//! The relay reads a single TOML document. Keys it understands are mapped onto
//! [`RelayConfig`]; the whole document is also kept as [`Settings`] so plugins
//! can read their own keys (`usermac_callback`, `logger_disable_accounting`, ...).

use crate::constants::{
    DEFAULT_ACCT_PORT, DEFAULT_AUTH_PORT, DEFAULT_LIB_DIR, DEFAULT_UPSTREAM_HOST,
    DEFAULT_UPSTREAM_PORT,
};
use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Run as the accounting sink instead of the relay
    pub accounting: bool,
    /// Upstream authority host
    pub host: String,
    /// Upstream authority port (relay role only)
    pub to: u16,
    /// Listen port; defaults by role when unset
    pub bind: Option<u16>,
    /// Library directory holding `secrets`, `users/` and `log/`
    pub dir: PathBuf,
    /// Allow plugins to cache decisions
    pub cache: bool,
    /// Verbose diagnostics (may expose the shared secret)
    pub debug: bool,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Plugins to load, in registration order
    pub plugins: Vec<String>,
    /// Serve Prometheus metrics on this address
    pub metrics_bind: Option<SocketAddr>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            accounting: false,
            host: DEFAULT_UPSTREAM_HOST.to_string(),
            to: DEFAULT_UPSTREAM_PORT,
            bind: None,
            dir: PathBuf::from(DEFAULT_LIB_DIR),
            cache: false,
            debug: false,
            log_level: "info".to_string(),
            plugins: Vec::new(),
            metrics_bind: None,
        }
    }
}

impl RelayConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(RelayError::Config("host is required".into()));
        }
        if let Some(name) = self.plugins.iter().find(|p| p.trim().is_empty()) {
            return Err(RelayError::Config(format!("invalid plugin name {name:?}")));
        }
        Ok(())
    }

    /// Port to listen on for the configured role.
    pub fn listen_port(&self) -> u16 {
        self.bind.unwrap_or(if self.accounting {
            DEFAULT_ACCT_PORT
        } else {
            DEFAULT_AUTH_PORT
        })
    }

    /// Upstream `host:port`. The accounting role never dials it.
    pub fn upstream(&self) -> String {
        format!("{}:{}", self.host, self.to)
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.dir.join("secrets")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.dir.join("log")
    }
}

/// Read-only access to every key of the configuration document.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    table: toml::Table,
}

impl Settings {
    pub fn new(table: toml::Table) -> Self {
        Self { table }
    }

    /// True when the key is the boolean `true` or the string `"true"`.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.table.get(key) {
            Some(toml::Value::Boolean(b)) => *b,
            Some(toml::Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.table.get(key).and_then(toml::Value::as_str)
    }

    /// String array value; a missing key or non-array value yields an empty list.
    pub fn get_array(&self, key: &str) -> Vec<String> {
        self.table
            .get(key)
            .and_then(toml::Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(ToOwned::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<toml::Table> for Settings {
    fn from(table: toml::Table) -> Self {
        Self::new(table)
    }
}

/// Parse a configuration document.
pub fn parse_config(data: &str) -> Result<(RelayConfig, Settings)> {
    let table: toml::Table = data
        .parse()
        .map_err(|e: toml::de::Error| RelayError::Config(e.to_string()))?;
    let config: RelayConfig = toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e: toml::de::Error| RelayError::Config(e.to_string()))?;
    config.validate()?;
    Ok((config, Settings::new(table)))
}

/// Load and validate the configuration file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<(RelayConfig, Settings)> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path).map_err(|e| {
        RelayError::Config(format!("unable to read {}: {e}", path.display()))
    })?;
    parse_config(&data)
}
