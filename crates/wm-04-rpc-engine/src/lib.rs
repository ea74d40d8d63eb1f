//! # wm-04-rpc-engine
//!
//! JSON-RPC-style method dispatch for the wallet mediator.
//!
//! ## Role in System
//!
//! - Holds the [`MethodRegistry`]: each method is a [`MethodSpec`] plus a
//!   [`MethodHandler`].
//! - Runs every request through the ordered validation pipeline before any
//!   handler touches state (see [`service`]).
//! - Injects an [`RpcContext`] exposing only what the method declared:
//!   wallet accessors, nested methods, the chain port and the result cache.
//! - Delegates page calls to consent-gated methods to
//!   [`wm_03_consent::ConsentProtocol`] and settles parked callers when the
//!   popup resolves them.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::OfflineChain;
pub use domain::{
    Access, CacheKey, CacheLookup, CachePolicy, Caller, EngineConfig, EngineError, Field, Method,
    MethodRegistry, MethodSpec, ParamSchema, SchemaViolation, TtlCache,
};
pub use ports::{ChainRpc, MethodHandler, RpcResult};
pub use service::{Dispatcher, RpcContext};
