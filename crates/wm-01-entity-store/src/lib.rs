//! # wm-01-entity-store
//!
//! Transactional typed entity tables for the wallet mediator.
//!
//! ## Role in System
//!
//! - **Single mutable shared resource**: every vault, account, address,
//!   network, site, app and pending consent request lives here.
//! - **Atomic batches**: a transaction either commits all its operations or
//!   none of them; readers never observe a partial batch.
//! - **Change feed**: each committed transaction is reported to a
//!   [`ports::ChangeNotifier`] (the shared bus in production).
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Atomicity | Undo log restored on any error or uncommitted drop |
//! | Referential integrity | Commit rejects missing references (`NotFound`) |
//! | No dangling references | Commit rejects deletes still referenced |
//! | Eids never reused | Monotonic atomic allocator |
//!
//! ## Operations
//!
//! | Operation | Method |
//! |-----------|--------|
//! | createEntity | [`EntityStore::create_entity`] |
//! | transact | [`EntityStore::transact`], [`EntityStore::transact_with`] |
//! | retractAttribute | [`EntityStore::retract_attribute`] |
//! | query | [`EntityStore::query`] |
//! | reference lookup | [`EntityStore::referrers`], [`domain::Tables::get`] |

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::BusNotifier;
pub use domain::*;
pub use ports::ChangeNotifier;
pub use service::{EntityStore, StoreStats};
