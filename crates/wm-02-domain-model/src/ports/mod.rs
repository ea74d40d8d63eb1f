//! Outbound ports of the domain model.

pub mod keyring;

pub use keyring::{AddressForms, DerivedKey, Keyring, KeyringError, NetworkParams};
