//! Chain node access.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::RpcError;
use wm_01_entity_store::Network;

/// Pass-through JSON-RPC to a network's endpoint.
///
/// Transport and node behavior live outside the mediator; handlers only
/// forward calls and shape the results.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn request(&self, network: &Network, method: &str, params: Value)
        -> Result<Value, RpcError>;
}
