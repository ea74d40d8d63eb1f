//! Adapters for the engine's outbound ports.

pub mod offline_chain;

pub use offline_chain::OfflineChain;
