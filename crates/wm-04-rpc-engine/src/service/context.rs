//! Per-call context handed to method handlers.

use super::Dispatcher;
use crate::domain::{Access, MethodSpec};
use crate::ports::RpcResult;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::{Eid, RpcError, RpcRequest};
use std::sync::Arc;
use wm_01_entity_store::Network;
use wm_02_domain_model::WalletDb;
use wm_03_consent::ConsentProtocol;

/// What a handler sees: the validated request, the resolved network, and
/// only the capabilities its [`MethodSpec`] declared.
#[derive(Clone)]
pub struct RpcContext {
    request: RpcRequest,
    network_eid: Eid,
    network: Network,
    spec: Arc<MethodSpec>,
    dispatcher: Dispatcher,
}

impl RpcContext {
    pub(super) fn new(
        request: RpcRequest,
        network_eid: Eid,
        network: Network,
        spec: Arc<MethodSpec>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            request,
            network_eid,
            network,
            spec,
            dispatcher,
        }
    }

    // =========================================================================
    // REQUEST
    // =========================================================================

    pub fn request(&self) -> &RpcRequest {
        &self.request
    }

    pub fn method(&self) -> &str {
        &self.request.method
    }

    pub fn params(&self) -> &Value {
        &self.request.params
    }

    /// Deserialize the whole params value.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, RpcError> {
        serde_json::from_value(self.request.params.clone())
            .map_err(|e| RpcError::invalid_params(format!("Invalid params: {e}")))
    }

    /// Deserialize positional param `index`; a missing param reads as null.
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, RpcError> {
        let value = self.request.params.get(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| RpcError::invalid_params(format!("Invalid params[{index}]: {e}")))
    }

    pub fn origin(&self) -> Option<&str> {
        self.request.origin.as_deref()
    }

    /// Origin of a page call.
    pub fn require_origin(&self) -> Result<&str, RpcError> {
        self.origin()
            .ok_or_else(|| RpcError::unauthorized("Request origin is required"))
    }

    /// AuthReq this call resolves, for popup resolutions.
    pub fn auth_req_id(&self) -> Option<Eid> {
        if self.request.popup {
            self.request.auth_req_id().map(Eid)
        } else {
            None
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_eid(&self) -> Eid {
        self.network_eid
    }

    // =========================================================================
    // CAPABILITIES
    // =========================================================================

    /// Wallet queries.
    pub fn reader(&self) -> Result<&WalletDb, RpcError> {
        self.db(Access::Read)
    }

    /// Wallet mutations.
    pub fn writer(&self) -> Result<&WalletDb, RpcError> {
        self.db(Access::Write)
    }

    /// Private keys and signing.
    pub fn keys(&self) -> Result<&WalletDb, RpcError> {
        self.db(Access::Keys)
    }

    fn db(&self, access: Access) -> Result<&WalletDb, RpcError> {
        if self.spec.grants(access) {
            Ok(self.dispatcher.db().as_ref())
        } else {
            Err(RpcError::internal(format!(
                "Method {} did not declare {access:?} access",
                self.spec.name
            )))
        }
    }

    pub fn consent(&self) -> &ConsentProtocol {
        self.dispatcher.consent()
    }

    /// Drop cached results computed against `network`.
    pub fn invalidate_cache(&self, network: &str) {
        self.dispatcher.cache().invalidate_network(network);
    }

    /// Forward a call to the resolved network's node.
    pub async fn chain(&self, method: &str, params: Value) -> RpcResult {
        self.chain_on(&self.network, method, params).await
    }

    /// Forward a call to another network's node.
    pub async fn chain_on(&self, network: &Network, method: &str, params: Value) -> RpcResult {
        self.dispatcher.chain().request(network, method, params).await
    }

    /// Nested call on the resolved network.
    pub async fn call(&self, method: &str, params: Value) -> RpcResult {
        let network = self.network.name.clone();
        self.call_on(&network, method, params).await
    }

    /// Nested call on a named network.
    ///
    /// The callee must be declared in this method's `methods`. The nested
    /// request is marked internal and keeps the caller flags.
    pub async fn call_on(&self, network: &str, method: &str, params: Value) -> RpcResult {
        if !self.spec.may_call(method) {
            return Err(RpcError::internal(format!(
                "Method {} is not allowed to call {method}",
                self.spec.name
            )));
        }
        let nested = self.request.nested(method, params, network);
        self.dispatcher.dispatch(nested).await
    }
}
