//! # Mediator Configuration
//!
//! Loaded in three layers: TOML file (optional), environment overrides,
//! validation.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `WM_CONFIG` | path of the TOML file |
//! | `WM_PRIMARY_NETWORK` | `engine.primary_network` |
//! | `WM_TRUSTED_ORIGINS` | `engine.trusted_origins` (comma separated) |
//! | `WM_LOG_LEVEL` | `telemetry.log_level` |

use serde::{Deserialize, Serialize};
use shared_types::{ChainFamily, Ticker};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wm_02_domain_model::NetworkSpec;
use wm_04_rpc_engine::{EngineConfig, EngineError};
use wm_05_wallet_rpcs::{default_hd_path, default_ticker};
use wm_telemetry::TelemetryConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Invalid engine config: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Complete mediator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    pub engine: EngineConfig,
    /// Networks created on first start. Existing names are left alone.
    pub networks: Vec<BuiltinNetwork>,
    pub telemetry: TelemetrySettings,
}

/// One builtin network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltinNetwork {
    pub name: String,
    #[serde(rename = "type")]
    pub family: ChainFamily,
    pub chain_id: String,
    pub net_id: u64,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<Ticker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hd_path: Option<String>,
}

impl BuiltinNetwork {
    fn new(name: &str, family: ChainFamily, chain_id: &str, net_id: u64, endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            family,
            chain_id: chain_id.to_string(),
            net_id,
            endpoint: endpoint.to_string(),
            ticker: None,
            hd_path: None,
        }
    }

    /// Creation spec, filling ticker and HD path from the family defaults.
    #[must_use]
    pub fn to_spec(&self) -> NetworkSpec {
        NetworkSpec {
            name: self.name.clone(),
            family: self.family,
            chain_id: self.chain_id.clone(),
            net_id: self.net_id,
            endpoint: self.endpoint.clone(),
            ticker: self
                .ticker
                .clone()
                .unwrap_or_else(|| default_ticker(self.family)),
            hd_path: self
                .hd_path
                .clone()
                .unwrap_or_else(|| default_hd_path(self.family).to_string()),
            builtin: true,
        }
    }
}

/// Logging settings layered over [`TelemetryConfig::from_env`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_logs: Option<bool>,
}

impl TelemetrySettings {
    #[must_use]
    pub fn apply(&self, mut config: TelemetryConfig) -> TelemetryConfig {
        if let Some(level) = &self.log_level {
            config = config.with_log_level(level.clone());
        }
        if let Some(json) = self.json_logs {
            config.json_logs = json;
        }
        config
    }
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            networks: vec![
                BuiltinNetwork::new(
                    "CFX_MAINNET",
                    ChainFamily::Cfx,
                    "0x405",
                    1029,
                    "https://main.confluxrpc.com",
                ),
                BuiltinNetwork::new(
                    "CFX_TESTNET",
                    ChainFamily::Cfx,
                    "0x1",
                    1,
                    "https://test.confluxrpc.com",
                ),
                BuiltinNetwork::new(
                    "ETH_MAINNET",
                    ChainFamily::Eth,
                    "0x1",
                    1,
                    "https://cloudflare-eth.com",
                ),
            ],
            telemetry: TelemetrySettings::default(),
        }
    }
}

impl MediatorConfig {
    /// Parse a TOML file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from `path` (or `WM_CONFIG`), apply the environment and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with an explicit variable lookup.
    pub fn load_with(
        path: Option<&Path>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| var("WM_CONFIG").map(PathBuf::from));
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(var);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(primary) = var("WM_PRIMARY_NETWORK") {
            self.engine.primary_network = primary;
        }
        if let Some(origins) = var("WM_TRUSTED_ORIGINS") {
            self.engine.trusted_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(level) = var("WM_LOG_LEVEL") {
            self.telemetry.log_level = Some(level);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.networks.is_empty() {
            return Err(ConfigError::Invalid("networks cannot be empty".into()));
        }
        let mut names = HashSet::new();
        for network in &self.networks {
            if network.name.trim().is_empty() {
                return Err(ConfigError::Invalid("network name cannot be empty".into()));
            }
            if !names.insert(network.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate network {}",
                    network.name
                )));
            }
            if !network.chain_id.starts_with("0x") {
                return Err(ConfigError::Invalid(format!(
                    "network {} chainId must be 0x-prefixed hex",
                    network.name
                )));
            }
        }
        if !names.contains(self.engine.primary_network.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "primary network {} is not configured",
                self.engine.primary_network
            )));
        }
        Ok(())
    }
}
