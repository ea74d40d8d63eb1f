//! Wire error type with JSON-RPC and EIP-1193 codes.

use crate::request::{ErrorObject, RpcRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error codes surfaced to callers.
pub mod codes {
    // JSON-RPC 2.0 standard errors
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Provider errors (EIP-1193)
    pub const USER_REJECTED: i32 = 4001;
    pub const UNAUTHORIZED: i32 = 4100;
    pub const UNSUPPORTED_METHOD: i32 = 4200;
    pub const DISCONNECTED: i32 = 4900;
    pub const CHAIN_DISCONNECTED: i32 = 4901;
}

/// Classification of an [`RpcError`].
///
/// Several kinds share the `INVALID_PARAMS` code on the wire; the kind keeps
/// them distinguishable in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Unknown method, or a method unreachable for this caller/lock state/network.
    MethodNotFound,
    /// Bad network name or params failing schema validation.
    InvalidParams,
    /// Consent denied.
    UserRejected,
    /// Origin has no App, or the App lacks the required grant.
    Unauthorized,
    /// Vault import collided with an existing credential.
    DuplicateCredential,
    /// Nickname collides within its group.
    InvalidNickname,
    /// Attempt to delete a builtin entity.
    BuiltinProtected,
    /// Operation not permitted for this entity (e.g. key of a pub vault).
    NotAllowed,
    /// Anything else, including upstream chain errors.
    Internal,
}

impl ErrorKind {
    /// Default wire code for the kind.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::MethodNotFound => codes::METHOD_NOT_FOUND,
            Self::InvalidParams
            | Self::DuplicateCredential
            | Self::InvalidNickname
            | Self::BuiltinProtected
            | Self::NotAllowed => codes::INVALID_PARAMS,
            Self::UserRejected => codes::USER_REJECTED,
            Self::Unauthorized => codes::UNAUTHORIZED,
            Self::Internal => codes::INTERNAL_ERROR,
        }
    }
}

/// Error returned by the dispatcher and every handler.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RpcError {
    pub kind: ErrorKind,
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
    /// The request that produced the error.
    pub request: Option<Box<RpcRequest>>,
}

impl RpcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.code(),
            message: message.into(),
            data: None,
            request: None,
        }
    }

    /// Attach diagnostic data.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach the originating request, keeping the first one attached.
    #[must_use]
    pub fn with_request(mut self, request: &RpcRequest) -> Self {
        if self.request.is_none() {
            self.request = Some(Box::new(request.clone()));
        }
        self
    }

    /// Override the wire code (used for upstream chain errors).
    #[must_use]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    /// Method not found, with a default message.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorKind::MethodNotFound, format!("Method {method} not found"))
    }

    /// Method not found, with an explanation suffix.
    pub fn method_not_found_because(method: &str, reason: &str) -> Self {
        Self::new(
            ErrorKind::MethodNotFound,
            format!("Method {method} not found, {reason}"),
        )
    }

    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, details)
    }

    /// Consent denied by the user.
    pub fn user_rejected() -> Self {
        Self::new(ErrorKind::UserRejected, "UserRejected 4001")
    }

    pub fn unauthorized(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, details)
    }

    pub fn duplicate_credential() -> Self {
        Self::new(ErrorKind::DuplicateCredential, "Duplicate credential")
    }

    pub fn invalid_nickname(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidNickname, details)
    }

    pub fn builtin_protected(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::BuiltinProtected, details)
    }

    pub fn not_allowed(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAllowed, details)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, details)
    }

    /// Wire form.
    #[must_use]
    pub fn to_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code,
            message: self.message.clone(),
            data: self.data.clone(),
        }
    }

    #[must_use]
    pub fn is_user_rejected(&self) -> bool {
        self.kind == ErrorKind::UserRejected
    }
}
