//! Engine construction errors.
//!
//! Request-time failures are [`shared_types::RpcError`]s; these only arise
//! while assembling a dispatcher.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Method {0} registered twice")]
    DuplicateMethod(String),

    /// A method declares a nested call to a method nobody registered.
    #[error("Method {method} declares unknown dependency {dependency}")]
    UnknownDependency { method: String, dependency: String },

    #[error("Invalid engine config: {0}")]
    InvalidConfig(String),
}
