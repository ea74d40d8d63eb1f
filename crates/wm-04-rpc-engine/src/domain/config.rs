//! Engine configuration.

use super::EngineError;
use serde::{Deserialize, Serialize};

/// Network used when a request names none.
pub const DEFAULT_PRIMARY_NETWORK: &str = "CFX_MAINNET";

/// Entries kept by the method result cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Network name resolved for requests without `networkName`.
    pub primary_network: String,
    /// Origins that skip origin scoping (the wallet's own pages).
    pub trusted_origins: Vec<String>,
    /// Capacity of the TTL result cache.
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_network: DEFAULT_PRIMARY_NETWORK.to_string(),
            trusted_origins: Vec::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.primary_network.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "primary_network cannot be empty".into(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "cache_capacity cannot be 0".into(),
            ));
        }
        if self.trusted_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(EngineError::InvalidConfig(
                "trusted_origins cannot contain empty origins".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_trusted(&self, origin: Option<&str>) -> bool {
        origin.is_some_and(|o| self.trusted_origins.iter().any(|t| t == o))
    }
}
