//! # Shared Types Crate
//!
//! Types that cross crate boundaries inside the mediator:
//!
//! - [`Eid`] and the small closed vocabularies (chain family, vault kind,
//!   permission names) every layer agrees on.
//! - [`RpcRequest`] / [`RpcResponse`], the JSON-RPC-style envelope carried
//!   between the page script, the popup and the background engine.
//! - [`RpcError`], the single error shape that reaches the wire.
//!
//! ## Design Principles
//!
//! - **Caller flags are data**: `_inpage`, `_origin` and `_popup` are plain
//!   fields supplied by the transport. The internal-call marker is not
//!   deserializable, so a caller cannot forge it.
//! - **One wire error**: every crate maps its own error enum into
//!   [`RpcError`] at the boundary.

pub mod entities;
pub mod errors;
pub mod request;

pub use entities::*;
pub use errors::*;
pub use request::*;
