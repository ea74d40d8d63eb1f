//! Consent error types.

use shared_types::{Eid, RpcError};
use thiserror::Error;
use wm_02_domain_model::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsentError {
    /// No pending consent request with this id.
    #[error("Invalid auth request id {0}")]
    UnknownAuthReq(Eid),

    /// A resolution must call the method the page asked for.
    #[error("Auth request {auth_req} is for {expected}, not {method}")]
    MethodMismatch {
        auth_req: Eid,
        expected: String,
        method: String,
    },

    /// Another resolution of this id is running.
    #[error("Auth request {0} is already being resolved")]
    AlreadyResolving(Eid),

    /// Only calls from a page can be parked; the page is identified by origin.
    #[error("Consent requires a request origin")]
    MissingOrigin,

    /// The parked call was dropped before a decision arrived.
    #[error("Auth request {0} was abandoned")]
    Abandoned(Eid),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type ConsentResult<T> = Result<T, ConsentError>;

impl From<ConsentError> for RpcError {
    fn from(err: ConsentError) -> Self {
        match err {
            ConsentError::UnknownAuthReq(_)
            | ConsentError::MethodMismatch { .. }
            | ConsentError::AlreadyResolving(_) => RpcError::invalid_params(err.to_string()),
            ConsentError::MissingOrigin => RpcError::unauthorized(err.to_string()),
            ConsentError::Abandoned(_) => RpcError::internal(err.to_string()),
            ConsentError::Domain(e) => e.into(),
        }
    }
}
