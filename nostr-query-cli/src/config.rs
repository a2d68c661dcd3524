use anyhow::{Context, Result};
use nostr_query_core::Relay;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relays used when neither the command line nor the config file names any
pub const DEFAULT_RELAYS: &[&str] = &["wss://relay.damus.io", "wss://nos.lol"];

/// Configuration file layout
///
/// ```toml
/// [[relays]]
/// url = "wss://relay.damus.io"
///
/// [[relays]]
/// url = "wss://inbox.example.com"
/// write = false
///
/// [query]
/// eose_timeout_ms = 3400
/// timeout_secs = 30
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub relays: Vec<Relay>,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueryConfig {
    /// Report EOSE after this long even if some relays never sent it
    #[serde(default = "default_eose_timeout_ms")]
    pub eose_timeout_ms: u64,
    /// Give up waiting for EOSE after this long
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            eose_timeout_ms: default_eose_timeout_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_eose_timeout_ms() -> u64 {
    3400
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file does not exist: {}", path.display());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Load the file if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for relay in &self.relays {
            validate_relay_url(&relay.url)?;
        }
        if self.query.timeout_secs == 0 {
            anyhow::bail!("query.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Relays to read from
    ///
    /// Relays given on the command line replace the configured ones and are
    /// used for reading and writing. With neither, [`DEFAULT_RELAYS`] apply.
    pub fn resolve_relays(&self, cli_relays: &[String]) -> Result<Vec<Relay>> {
        if !cli_relays.is_empty() {
            return cli_relays
                .iter()
                .map(|url| {
                    validate_relay_url(url)?;
                    Ok(Relay::read_write(url.clone()))
                })
                .collect();
        }
        if !self.relays.is_empty() {
            return Ok(self.relays.clone());
        }
        Ok(DEFAULT_RELAYS.iter().map(|url| Relay::read_write(*url)).collect())
    }
}

pub fn validate_relay_url(url: &str) -> Result<()> {
    if url.starts_with("wss://") || url.starts_with("ws://") {
        Ok(())
    } else {
        anyhow::bail!("Relay URL must start with ws:// or wss://: {}", url)
    }
}
