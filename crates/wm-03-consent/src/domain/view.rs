//! Popup-facing view of a pending consent request.

use serde::Serialize;
use serde_json::Value;
use shared_types::Eid;
use wm_01_entity_store::Site;

/// The call a site is waiting on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingCall {
    pub method: String,
    pub params: Value,
}

/// One entry of `wallet_getPendingAuthRequest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAuthReq {
    pub auth_req_id: Eid,
    pub site: Site,
    /// The site's App, if it already has one.
    pub app: Option<Eid>,
    pub req: PendingCall,
}
