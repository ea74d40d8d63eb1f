//! Domain layer: entity kinds, attributes, tables and transactions.

pub mod attrs;
pub mod entities;
pub mod errors;
pub mod tables;
pub mod tx;

pub use attrs::{Attr, AttrName, Attributes};
pub use entities::*;
pub use errors::StoreError;
pub use tables::{Entity, EntityKind, Record, Tables};
pub use tx::{Tx, TxOp, TxReport};
