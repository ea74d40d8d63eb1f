//! Method handlers, grouped by area.
//!
//! Each module registers its [`MethodSpec`]s next to the handlers, so the
//! policy of a method (callers, lock state, accessors, consent, schema) sits
//! beside its body.

mod app;
mod chain;
mod consent;
mod network;
mod session;
mod vault;

pub use network::{default_hd_path, default_ticker, CFX_HD_PATH, ETH_HD_PATH};

use serde::Serialize;
use serde_json::Value;
use shared_types::{Eid, RpcError};
use wm_01_entity_store::AuthReq;
use wm_04_rpc_engine::{EngineError, MethodRegistry, RpcContext, RpcResult};

/// Methods a popup approval may resolve.
pub const CONSENT_METHODS: &[&str] = &[
    "wallet_requestPermissions",
    "personal_sign",
    "wallet_switchEthereumChain",
    "wallet_addEthereumChain",
];

/// Register every wallet method.
pub fn register_all(registry: &mut MethodRegistry) -> Result<(), EngineError> {
    session::register(registry)?;
    vault::register(registry)?;
    network::register(registry)?;
    app::register(registry)?;
    consent::register(registry)?;
    chain::register(registry)?;
    Ok(())
}

/// A validated registry holding every wallet method.
pub fn registry() -> Result<MethodRegistry, EngineError> {
    let mut registry = MethodRegistry::new();
    register_all(&mut registry)?;
    registry.validate()?;
    Ok(registry)
}

// =============================================================================
// HANDLER HELPERS
// =============================================================================

pub(crate) fn to_result<T: Serialize>(value: T) -> RpcResult {
    serde_json::to_value(value).map_err(|e| RpcError::internal(format!("Serialize result: {e}")))
}

/// The pending AuthReq a popup resolution settles.
pub(crate) fn resolving(ctx: &RpcContext) -> Result<(Eid, AuthReq), RpcError> {
    let id = ctx.auth_req_id().ok_or_else(|| {
        RpcError::invalid_params(format!("Method {} must be resolved with an authReqId", ctx.method()))
    })?;
    Ok((id, ctx.consent().auth_req(id)?))
}

/// Positional param `index` of the request a resolution settles.
pub(crate) fn original_arg(auth_req: &AuthReq, index: usize) -> Value {
    auth_req
        .request
        .params
        .get(index)
        .cloned()
        .unwrap_or(Value::Null)
}
