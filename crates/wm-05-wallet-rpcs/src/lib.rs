//! # wm-05-wallet-rpcs
//!
//! The wallet's method table: every named method with its policy and handler.
//!
//! ## Areas
//!
//! | Module | Methods |
//! |--------|---------|
//! | `session` | lock, unlock, lock state |
//! | `vault` | imports, account groups, accounts, export |
//! | `network` | network CRUD and selection |
//! | `app` | site metadata, permission grants, per-App selection |
//! | `consent` | pending requests, approve, reject |
//! | `chain` | account exposure, chain identity, node pass-throughs, signing, chain switching, discovery |
//!
//! [`registry()`] builds a validated [`wm_04_rpc_engine::MethodRegistry`]
//! with all of them; the dispatcher does the rest.

pub mod rpc;
pub mod views;

#[cfg(test)]
mod testing;

pub use rpc::{
    default_hd_path, default_ticker, register_all, registry, CFX_HD_PATH, CONSENT_METHODS,
    ETH_HD_PATH,
};
