//! Validation steps and execution.

use super::{Dispatcher, RpcContext};
use crate::domain::{CacheLookup, Caller, EngineConfig, Method, MethodSpec};
use crate::ports::RpcResult;
use serde_json::{json, Value};
use shared_types::{ChainFamily, Eid, ErrorKind, RpcError, RpcRequest};
use tracing::debug;
use wm_01_entity_store::Network;
use wm_03_consent::ConsentProtocol;

/// Epoch reference defaulted for `cfx_epochNumber` instead of the family default.
const EPOCH_NUMBER_DEFAULT: &str = "latest_mined";

impl Dispatcher {
    pub(super) async fn run(&self, request: RpcRequest) -> RpcResult {
        let method = self.lookup(&request)?;
        check_origin(&self.inner.config, &request, &method.spec)?;
        check_lock(self.inner.db.is_locked(), &request, &method.spec)?;

        let (network_eid, network) = self.resolve_network(&request)?;
        let mut request = request;
        request.network_name = Some(network.name.clone());

        default_block_ref(&mut request, &method.spec, &network);
        check_family(&request, &network)?;
        check_schema(&request, &method.spec)?;
        if let Some(normalize) = method.spec.normalize {
            normalize(&mut request.params);
        }

        self.execute(method, request, network_eid, network).await
    }

    fn lookup(&self, request: &RpcRequest) -> Result<Method, RpcError> {
        self.inner
            .registry
            .get(&request.method)
            .cloned()
            .ok_or_else(|| {
                debug!(method = %request.method, "Unknown method");
                RpcError::method_not_found(&request.method)
            })
    }

    fn resolve_network(&self, request: &RpcRequest) -> Result<(Eid, Network), RpcError> {
        let name = request
            .network_name
            .as_deref()
            .unwrap_or(&self.inner.config.primary_network);
        self.network_named(&request.method, name)
    }

    fn network_named(&self, method: &str, name: &str) -> Result<(Eid, Network), RpcError> {
        self.inner.db.network_by_name(name).ok_or_else(|| {
            debug!(method = method, network = name, "Unknown network");
            RpcError::invalid_params(format!("Invalid network name {name}"))
        })
    }

    // =========================================================================
    // EXECUTION
    // =========================================================================

    async fn execute(
        &self,
        method: Method,
        request: RpcRequest,
        network_eid: Eid,
        network: Network,
    ) -> RpcResult {
        if method.spec.consent {
            if let Some(auth_req) = resolution_of(&request) {
                return self.resolve(method, request, network_eid, network, auth_req).await;
            }
        }
        if request.inpage && method.spec.requires_app {
            self.check_app(&request)?;
        }
        if method.spec.consent && request.inpage {
            debug!(method = %request.method, "Parking call for user consent");
            return self.inner.consent.park(&request).await;
        }
        self.invoke(method, request, network_eid, network).await
    }

    /// Run a popup resolution and settle the parked caller with its outcome.
    ///
    /// The resolution must call the parked method and runs on the network the
    /// page asked on. The popup sees `"0x1"` for approvals and rejections; any
    /// other handler error reaches both the popup and the parked caller.
    async fn resolve(
        &self,
        method: Method,
        mut request: RpcRequest,
        network_eid: Eid,
        network: Network,
        auth_req: Eid,
    ) -> RpcResult {
        let record = self.inner.consent.claim(auth_req, &request.method)?;
        let _claim = Claim {
            consent: &self.inner.consent,
            auth_req,
        };
        let (network_eid, network) = match record.request.network_name.as_deref() {
            Some(name) if name != network.name => self.network_named(&request.method, name)?,
            _ => (network_eid, network),
        };
        request.network_name = Some(network.name.clone());

        let outcome = self.invoke(method, request, network_eid, network).await;
        if let Err(err) = self.inner.consent.settle(auth_req, outcome.clone()) {
            return Err(match outcome {
                Err(handler_err) => handler_err,
                Ok(_) => err.into(),
            });
        }
        match outcome {
            Ok(_) => Ok(json!("0x1")),
            Err(err) if err.is_user_rejected() => Ok(json!("0x1")),
            Err(err) => Err(err),
        }
    }

    async fn invoke(
        &self,
        method: Method,
        request: RpcRequest,
        network_eid: Eid,
        network: Network,
    ) -> RpcResult {
        let cache = method
            .spec
            .cache
            .as_ref()
            .map(|policy| (policy.key_for(&request.method, &network.name), policy.ttl));
        if let Some((key, _)) = &cache {
            if let CacheLookup::Hit(value) = self.inner.cache.get(key) {
                debug!(key = %key, "Cache hit");
                return Ok(value);
            }
        }

        let ctx = RpcContext::new(
            request,
            network_eid,
            network,
            method.spec.clone(),
            self.clone(),
        );
        let value = method.handler.call(ctx).await?;

        if let Some((key, ttl)) = cache {
            self.inner.cache.put(key, value.clone(), ttl);
        }
        Ok(value)
    }

    /// Page calls to app-scoped methods need an App for the calling site.
    fn check_app(&self, request: &RpcRequest) -> Result<(), RpcError> {
        let origin = request.origin.as_deref().unwrap_or_default();
        if self.inner.db.app_for_origin(origin).is_some() {
            return Ok(());
        }
        debug!(method = %request.method, origin = origin, "Site has no App");
        Err(RpcError::unauthorized(format!(
            "Site {origin} is not authorized, request permissions first"
        )))
    }
}

/// Releases a resolution claim when the resolving call ends, settled or not.
struct Claim<'a> {
    consent: &'a ConsentProtocol,
    auth_req: Eid,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.consent.release(self.auth_req);
    }
}

// =============================================================================
// STEPS
// =============================================================================

fn reject(method: &str, reason: &str) -> RpcError {
    debug!(method = method, reason = reason, "Request rejected");
    RpcError::method_not_found_because(method, reason)
}

/// Step 2: origin scoping. Only flagged callers are scoped; an unflagged
/// request reaches anything but internal-only methods.
pub(crate) fn check_origin(
    config: &EngineConfig,
    request: &RpcRequest,
    spec: &MethodSpec,
) -> Result<(), RpcError> {
    if request.is_internal() || config.is_trusted(request.origin.as_deref()) {
        return Ok(());
    }
    let method = request.method.as_str();
    if spec.is_internal_only() {
        return Err(reject(method, "not allowed to call internal method directly"));
    }
    let caller = if request.inpage {
        if request.origin.is_none() {
            return Err(reject(method, "inpage request without origin"));
        }
        Caller::Inpage
    } else if request.popup {
        Caller::Popup
    } else {
        return Ok(());
    };
    if !spec.allows(caller) {
        return Err(reject(
            method,
            &format!("not allowed to call from {}", caller.as_str()),
        ));
    }
    Ok(())
}

/// Step 3: lock state.
pub(crate) fn check_lock(
    locked: bool,
    request: &RpcRequest,
    spec: &MethodSpec,
) -> Result<(), RpcError> {
    if locked && !spec.locked {
        return Err(reject(&request.method, "wallet is locked"));
    }
    Ok(())
}

/// Step 5: fill an omitted block/epoch reference.
pub(crate) fn default_block_ref(request: &mut RpcRequest, spec: &MethodSpec, network: &Network) {
    let Some(position) = spec.block_ref_position() else {
        return;
    };
    let default = if request.method == "cfx_epochNumber" {
        EPOCH_NUMBER_DEFAULT
    } else {
        network.family.default_block_ref()
    };
    if request.params.is_null() {
        request.params = Value::Array(Vec::new());
    }
    if let Value::Array(items) = &mut request.params {
        if items.len() == position {
            items.push(Value::String(default.to_string()));
        } else if items.get(position).is_some_and(Value::is_null) {
            items[position] = Value::String(default.to_string());
        }
    }
}

/// Step 6: method prefix family against network family.
pub(crate) fn check_family(request: &RpcRequest, network: &Network) -> Result<(), RpcError> {
    match ChainFamily::from_method(&request.method) {
        Some(family) if family != network.family => {
            debug!(method = %request.method, network = %network.name, "Family mismatch");
            Err(RpcError::new(
                ErrorKind::MethodNotFound,
                format!(
                    "Method {} not supported by network {}",
                    request.method, network.name
                ),
            ))
        }
        _ => Ok(()),
    }
}

/// Step 7: params schema.
pub(crate) fn check_schema(request: &RpcRequest, spec: &MethodSpec) -> Result<(), RpcError> {
    let Some(schema) = &spec.schema else {
        return Ok(());
    };
    schema.validate(&request.params).map_err(|violation| {
        debug!(method = %request.method, violation = %violation, "Invalid params");
        RpcError::invalid_params(format!("Invalid params: {violation}")).with_data(json!({
            "params": request.params,
            "explanation": violation.to_value(),
        }))
    })
}

/// AuthReq id of a popup resolution request.
fn resolution_of(request: &RpcRequest) -> Option<Eid> {
    if request.popup {
        request.auth_req_id().map(Eid)
    } else {
        None
    }
}
