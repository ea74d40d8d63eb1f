//! Chain adapter answering from network records and canned responses.
//!
//! Used when no node transport is wired in, and by tests to script node
//! behavior and count upstream calls.

use crate::ports::ChainRpc;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use shared_types::RpcError;
use tracing::debug;
use wm_01_entity_store::Network;

/// Offline [`ChainRpc`].
///
/// Resolution order for a call: scripted failure, scripted response, then a
/// value derived from the network record for the status-style methods.
/// Anything else fails as unreachable.
#[derive(Default)]
pub struct OfflineChain {
    responses: DashMap<String, Value>,
    failures: DashMap<String, RpcError>,
    calls: DashMap<String, u64>,
}

impl OfflineChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with `value` on every network.
    pub fn respond(&self, method: &str, value: Value) -> &Self {
        self.responses.insert(method.to_string(), value);
        self
    }

    /// Fail `method` with `error` on every network.
    pub fn fail(&self, method: &str, error: RpcError) -> &Self {
        self.failures.insert(method.to_string(), error);
        self
    }

    /// How many times `method` reached this adapter.
    pub fn calls(&self, method: &str) -> u64 {
        self.calls.get(method).map_or(0, |c| *c)
    }

    fn derived(network: &Network, method: &str) -> Option<Value> {
        let value = match method {
            "cfx_getStatus" => json!({
                "chainId": network.chain_id,
                "networkId": format!("{:#x}", network.net_id),
                "epochNumber": "0x0",
                "blockNumber": "0x0",
            }),
            "cfx_chainId" | "eth_chainId" => json!(network.chain_id),
            "net_version" => json!(network.net_id.to_string()),
            "cfx_epochNumber" | "eth_blockNumber" => json!("0x0"),
            "cfx_getBalance" | "eth_getBalance" => json!("0x0"),
            "cfx_getNextNonce" | "eth_getTransactionCount" => json!("0x0"),
            _ => return None,
        };
        Some(value)
    }
}

#[async_trait]
impl ChainRpc for OfflineChain {
    async fn request(
        &self,
        network: &Network,
        method: &str,
        _params: Value,
    ) -> Result<Value, RpcError> {
        *self.calls.entry(method.to_string()).or_insert(0) += 1;
        debug!(network = %network.name, method = method, "Offline chain request");

        if let Some(err) = self.failures.get(method) {
            return Err(err.clone());
        }
        if let Some(value) = self.responses.get(method) {
            return Ok(value.clone());
        }
        Self::derived(network, method).ok_or_else(|| {
            RpcError::internal(format!(
                "Network {} endpoint {} unreachable for {method}",
                network.name, network.endpoint
            ))
        })
    }
}
