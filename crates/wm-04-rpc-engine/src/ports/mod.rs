//! Ports of the RPC engine.

pub mod inbound;
pub mod outbound;

pub use inbound::{MethodHandler, RpcResult};
pub use outbound::ChainRpc;
