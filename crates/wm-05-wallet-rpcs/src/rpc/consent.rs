//! Popup side of the consent protocol.

use super::{to_result, CONSENT_METHODS};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use shared_types::{Eid, RpcError};
use tracing::info;
use wm_04_rpc_engine::{
    EngineError, Field, MethodRegistry, MethodSpec, ParamSchema, RpcContext, RpcResult,
};

pub(super) fn register(registry: &mut MethodRegistry) -> Result<(), EngineError> {
    registry.register(
        MethodSpec::new("wallet_getPendingAuthRequest")
            .popup()
            .allow_locked(),
        get_pending_auth_request,
    )?;
    registry.register(
        MethodSpec::new("wallet_userApprovedAuthRequest")
            .popup()
            .allow_locked()
            .calls(CONSENT_METHODS)
            .schema(ParamSchema::object([
                Field::required("authReqId", ParamSchema::Uint),
                Field::optional("res", ParamSchema::Any),
            ])),
        user_approved,
    )?;
    registry.register(
        MethodSpec::new("wallet_userRejectedAuthRequest")
            .popup()
            .allow_locked()
            .schema(ParamSchema::object([Field::required(
                "authReqId",
                ParamSchema::Uint,
            )])),
        user_rejected,
    )?;
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Decision {
    auth_req_id: Eid,
    #[serde(default)]
    res: Value,
}

async fn get_pending_auth_request(ctx: RpcContext) -> RpcResult {
    to_result(ctx.consent().pending_requests())
}

/// Resolve an AuthReq by re-running its method with the user's decision.
///
/// The decision object (`res`) becomes the params of the resolving call,
/// together with the `authReqId`. The call runs on the network the parked
/// request was made on.
async fn user_approved(ctx: RpcContext) -> RpcResult {
    let decision: Decision = ctx.params_as()?;
    let auth_req = ctx.consent().auth_req(decision.auth_req_id)?;

    let mut params = match decision.res {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(RpcError::invalid_params(format!(
                "Invalid params: res must be an object, got {other}"
            )))
        }
    };
    params.insert("authReqId".into(), json!(decision.auth_req_id));

    let network = auth_req
        .request
        .network_name
        .clone()
        .unwrap_or_else(|| ctx.network().name.clone());
    info!(
        auth_req = %decision.auth_req_id,
        method = %auth_req.request.method,
        network = %network,
        "User approved"
    );
    ctx.call_on(&network, &auth_req.request.method, Value::Object(params))
        .await
}

async fn user_rejected(ctx: RpcContext) -> RpcResult {
    let decision: Decision = ctx.params_as()?;
    ctx.consent().reject(decision.auth_req_id)?;
    Ok(json!("0x1"))
}
