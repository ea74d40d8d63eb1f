//! Keyring adapters.

pub mod hash_keyring;

pub use hash_keyring::HashKeyring;
