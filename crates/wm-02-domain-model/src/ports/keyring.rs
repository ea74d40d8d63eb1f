//! Keyring port: everything cryptographic the domain model consumes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::ChainFamily;
use thiserror::Error;

/// Errors from keyring operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyringError {
    /// Ciphertext failed authentication under the given password.
    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid mnemonic")]
    InvalidMnemonic,

    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Malformed ciphertext")]
    MalformedCiphertext,

    /// The AEAD cipher refused the input.
    #[error("Encryption failed: {0}")]
    Cipher(String),
}

/// Network parameters that affect address encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    pub family: ChainFamily,
    pub net_id: u64,
}

/// Address representations on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForms {
    pub hex: String,
    pub cfx_hex: Option<String>,
    pub base32: Option<String>,
}

/// Address plus the private key it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    pub forms: AddressForms,
    pub private_key: String,
}

/// Cryptographic capabilities consumed by the wallet.
///
/// `encrypt`/`decrypt` may be slow (key stretching) and are async; the
/// derivation functions are pure and run inside store transactions.
#[async_trait]
pub trait Keyring: Send + Sync {
    async fn encrypt(&self, password: &str, secret: &str) -> Result<String, KeyringError>;

    async fn decrypt(&self, password: &str, ciphertext: &str) -> Result<String, KeyringError>;

    /// Stable identifier of a credential, used for duplicate detection.
    /// Must not reveal the credential.
    fn fingerprint(&self, credential: &str) -> String;

    /// Derive the `index`-th key of `mnemonic` along `hd_path`.
    fn derive_nth(
        &self,
        mnemonic: &str,
        hd_path: &str,
        index: u32,
        network: NetworkParams,
    ) -> Result<DerivedKey, KeyringError>;

    /// Address of a raw private key.
    fn from_private_key(
        &self,
        private_key: &str,
        network: NetworkParams,
    ) -> Result<DerivedKey, KeyringError>;

    /// Parse a public address and re-encode it for `network`.
    fn from_address(
        &self,
        address: &str,
        network: NetworkParams,
    ) -> Result<AddressForms, KeyringError>;

    /// Family an address string belongs to.
    fn address_family(&self, address: &str) -> Result<ChainFamily, KeyringError>;

    /// Sign a personal message.
    fn sign_message(&self, private_key: &str, message: &str) -> Result<String, KeyringError>;
}
