//! Decrypted vault material.

use crate::ports::{AddressForms, Keyring, KeyringError, NetworkParams};
use shared_types::VaultKind;
use std::fmt;

/// Plaintext credential of a vault.
///
/// Obtained by decrypting `Vault::ddata` (or reading `Vault::address` for
/// watch-only vaults). Never stored, never logged.
#[derive(Clone, PartialEq, Eq)]
pub enum VaultSecret {
    Mnemonic(String),
    PrivateKey(String),
    Address(String),
}

impl fmt::Debug for VaultSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VaultSecret::{:?}(..)", self.kind())
    }
}

impl VaultSecret {
    /// Wrap decrypted plaintext according to the vault kind.
    #[must_use]
    pub fn from_plaintext(kind: VaultKind, plaintext: String) -> Self {
        match kind {
            VaultKind::Hd => Self::Mnemonic(plaintext),
            VaultKind::Pk => Self::PrivateKey(plaintext),
            VaultKind::Pub => Self::Address(plaintext),
        }
    }

    #[must_use]
    pub fn kind(&self) -> VaultKind {
        match self {
            Self::Mnemonic(_) => VaultKind::Hd,
            Self::PrivateKey(_) => VaultKind::Pk,
            Self::Address(_) => VaultKind::Pub,
        }
    }

    /// The string the duplicate check fingerprints.
    ///
    /// Mnemonics are whitespace-normalized and addresses are reduced to
    /// their account hex, so both spellings of one address collide.
    pub fn credential(&self, keyring: &dyn Keyring) -> Result<String, KeyringError> {
        Ok(match self {
            Self::Mnemonic(m) => m.split_whitespace().collect::<Vec<_>>().join(" "),
            Self::PrivateKey(pk) => pk.clone(),
            Self::Address(addr) => {
                let family = keyring.address_family(addr)?;
                keyring
                    .from_address(addr, NetworkParams { family, net_id: 0 })?
                    .hex
            }
        })
    }

    /// Address forms of account `index` on one network, plus its private key
    /// when the vault has one.
    pub fn derive(
        &self,
        keyring: &dyn Keyring,
        hd_path: &str,
        index: u32,
        network: NetworkParams,
    ) -> Result<(AddressForms, Option<String>), KeyringError> {
        match self {
            Self::Mnemonic(m) => {
                let key = keyring.derive_nth(m, hd_path, index, network)?;
                Ok((key.forms, Some(key.private_key)))
            }
            Self::PrivateKey(pk) => {
                let key = keyring.from_private_key(pk, network)?;
                Ok((key.forms, Some(key.private_key)))
            }
            Self::Address(addr) => Ok((keyring.from_address(addr, network)?, None)),
        }
    }
}
