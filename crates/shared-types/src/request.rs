//! # Request / Response Envelope
//!
//! The JSON-RPC-style message shape exchanged with page scripts and the popup.

use crate::errors::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version tag.
pub const JSONRPC_VERSION: &str = "2.0";

/// Inbound request.
///
/// `_inpage`, `_origin` and `_popup` are set by the transport. `call_stack`
/// is the internal-call marker: it is never read from the wire and is only
/// populated by [`RpcRequest::nested`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
    #[serde(default, rename = "_inpage")]
    pub inpage: bool,
    #[serde(default, rename = "_origin", skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, rename = "_popup")]
    pub popup: bool,
    #[serde(skip)]
    pub call_stack: Vec<String>,
}

impl RpcRequest {
    /// Build a plain request with no caller flags.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
            ..Self::default()
        }
    }

    /// Mark the request as coming from a page script at `origin`.
    #[must_use]
    pub fn from_inpage(mut self, origin: impl Into<String>) -> Self {
        self.inpage = true;
        self.origin = Some(origin.into());
        self
    }

    /// Mark the request as coming from the wallet popup.
    #[must_use]
    pub fn from_popup(mut self) -> Self {
        self.popup = true;
        self
    }

    /// Target a specific network by name.
    #[must_use]
    pub fn on_network(mut self, name: impl Into<String>) -> Self {
        self.network_name = Some(name.into());
        self
    }

    /// Whether this request was issued by another method's execution.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        !self.call_stack.is_empty()
    }

    /// Derive a nested request issued from within this request's handler.
    ///
    /// Caller flags and the resolved network propagate; the call stack grows
    /// by the parent method, which marks the child as internal.
    #[must_use]
    pub fn nested(&self, method: impl Into<String>, params: Value, network_name: &str) -> Self {
        let mut call_stack = self.call_stack.clone();
        call_stack.push(self.method.clone());
        Self {
            id: None,
            method: method.into(),
            params,
            network_name: Some(network_name.to_string()),
            inpage: self.inpage,
            origin: self.origin.clone(),
            popup: self.popup,
            call_stack,
        }
    }

    /// Value of `params.authReqId` when params is an object carrying one.
    #[must_use]
    pub fn auth_req_id(&self) -> Option<u64> {
        self.params.get("authReqId").and_then(Value::as_u64)
    }
}

/// Wire form of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Result or error half of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    Result(Value),
    Error(ErrorObject),
}

/// Outbound response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl RpcResponse {
    /// Successful response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: ResponsePayload::Result(result),
        }
    }

    /// Error response.
    pub fn failure(id: Option<Value>, error: &RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: ResponsePayload::Error(error.to_object()),
        }
    }

    /// Build from a dispatcher outcome.
    pub fn from_result(id: Option<Value>, result: Result<Value, RpcError>) -> Self {
        match result {
            Ok(value) => Self::success(id, value),
            Err(err) => Self::failure(id, &err),
        }
    }

    /// Result value, if this is a success.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(v) => Some(v),
            ResponsePayload::Error(_) => None,
        }
    }

    /// Error object, if this is a failure.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorObject> {
        match &self.payload {
            ResponsePayload::Result(_) => None,
            ResponsePayload::Error(e) => Some(e),
        }
    }
}
