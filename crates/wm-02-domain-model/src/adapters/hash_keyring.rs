//! Deterministic hash-based keyring.
//!
//! Implements the [`Keyring`] port with sha2/sha3/hmac. Key derivation and
//! address encoding are stand-ins with the right shapes (20-byte accounts,
//! cfx type nibble, network-prefixed cfx addresses); they are not BIP-32 or
//! CIP-37 compatible. Secrets are sealed with XChaCha20-Poly1305 under a
//! password-stretched key, so a wrong password fails authentication.

use crate::ports::{AddressForms, DerivedKey, Keyring, KeyringError, NetworkParams};
use async_trait::async_trait;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use shared_types::ChainFamily;

type HmacSha256 = Hmac<Sha256>;

const FINGERPRINT_DOMAIN: &[u8] = b"wm-vault-fingerprint:";
const STRETCH_ROUNDS: usize = 2048;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;
const MNEMONIC_LENGTHS: [usize; 5] = [12, 15, 18, 21, 24];

/// Placeholder keyring used by the runtime and the test suites.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashKeyring;

impl HashKeyring {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn stretch(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut digest: [u8; 32] = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize()
        .into();
    for _ in 0..STRETCH_ROUNDS {
        digest = Sha256::digest(digest).into();
    }
    digest
}

fn cipher(password: &str, salt: &[u8]) -> XChaCha20Poly1305 {
    let key = stretch(password, salt);
    XChaCha20Poly1305::new((&key).into())
}

fn parse_private_key(private_key: &str) -> Result<[u8; 32], KeyringError> {
    let raw = private_key.strip_prefix("0x").unwrap_or(private_key);
    let bytes = hex::decode(raw).map_err(|_| KeyringError::InvalidPrivateKey)?;
    bytes
        .try_into()
        .map_err(|_| KeyringError::InvalidPrivateKey)
}

fn cfx_prefix(net_id: u64) -> String {
    match net_id {
        1029 => "cfx".to_string(),
        1 => "cfxtest".to_string(),
        other => format!("net{other}"),
    }
}

fn encode_forms(account: [u8; 20], network: NetworkParams) -> AddressForms {
    let hex = format!("0x{}", hex::encode(account));
    match network.family {
        ChainFamily::Eth => AddressForms {
            hex,
            cfx_hex: None,
            base32: None,
        },
        ChainFamily::Cfx => {
            let mut user = account;
            user[0] = 0x10 | (user[0] & 0x0f);
            AddressForms {
                hex,
                cfx_hex: Some(format!("0x{}", hex::encode(user))),
                base32: Some(format!("{}:{}", cfx_prefix(network.net_id), hex::encode(user))),
            }
        }
    }
}

fn parse_account(address: &str) -> Result<[u8; 20], KeyringError> {
    let invalid = || KeyringError::InvalidAddress(address.to_string());
    let raw = match address.split_once(':') {
        Some((_, body)) => body,
        None => address.strip_prefix("0x").ok_or_else(invalid)?,
    };
    let bytes = hex::decode(raw.to_ascii_lowercase()).map_err(|_| invalid())?;
    bytes.try_into().map_err(|_| invalid())
}

#[async_trait]
impl Keyring for HashKeyring {
    async fn encrypt(&self, password: &str, secret: &str) -> Result<String, KeyringError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = cipher(password, &salt)
            .encrypt(XNonce::from_slice(&nonce), secret.as_bytes())
            .map_err(|e| KeyringError::Cipher(e.to_string()))?;
        Ok(format!(
            "{}.{}.{}",
            hex::encode(salt),
            hex::encode(nonce),
            hex::encode(sealed)
        ))
    }

    async fn decrypt(&self, password: &str, ciphertext: &str) -> Result<String, KeyringError> {
        let mut parts = ciphertext.split('.');
        let (Some(salt), Some(nonce), Some(sealed), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(KeyringError::MalformedCiphertext);
        };
        let decode = |s: &str| hex::decode(s).map_err(|_| KeyringError::MalformedCiphertext);
        let (salt, nonce, sealed) = (decode(salt)?, decode(nonce)?, decode(sealed)?);
        if nonce.len() != NONCE_LEN {
            return Err(KeyringError::MalformedCiphertext);
        }

        let plain = cipher(password, &salt)
            .decrypt(XNonce::from_slice(&nonce), sealed.as_slice())
            .map_err(|_| KeyringError::InvalidPassword)?;
        String::from_utf8(plain).map_err(|_| KeyringError::MalformedCiphertext)
    }

    fn fingerprint(&self, credential: &str) -> String {
        let normalized = credential.trim().to_ascii_lowercase();
        let normalized = normalized.strip_prefix("0x").unwrap_or(&normalized);
        hex::encode(
            Sha256::new()
                .chain_update(FINGERPRINT_DOMAIN)
                .chain_update(normalized.as_bytes())
                .finalize(),
        )
    }

    fn derive_nth(
        &self,
        mnemonic: &str,
        hd_path: &str,
        index: u32,
        network: NetworkParams,
    ) -> Result<DerivedKey, KeyringError> {
        let words: Vec<&str> = mnemonic.split_whitespace().collect();
        if !MNEMONIC_LENGTHS.contains(&words.len())
            || !words.iter().all(|w| w.chars().all(|c| c.is_ascii_lowercase()))
        {
            return Err(KeyringError::InvalidMnemonic);
        }
        let seed = Keccak256::new()
            .chain_update(words.join(" ").as_bytes())
            .chain_update(b"|")
            .chain_update(hd_path.as_bytes())
            .chain_update(index.to_be_bytes())
            .finalize();
        self.from_private_key(&format!("0x{}", hex::encode(seed)), network)
    }

    fn from_private_key(
        &self,
        private_key: &str,
        network: NetworkParams,
    ) -> Result<DerivedKey, KeyringError> {
        let key = parse_private_key(private_key)?;
        let digest = Keccak256::digest(key);
        let mut account = [0u8; 20];
        account.copy_from_slice(&digest[12..]);
        Ok(DerivedKey {
            forms: encode_forms(account, network),
            private_key: format!("0x{}", hex::encode(key)),
        })
    }

    fn from_address(
        &self,
        address: &str,
        network: NetworkParams,
    ) -> Result<AddressForms, KeyringError> {
        Ok(encode_forms(parse_account(address)?, network))
    }

    fn address_family(&self, address: &str) -> Result<ChainFamily, KeyringError> {
        parse_account(address)?;
        Ok(if address.contains(':') {
            ChainFamily::Cfx
        } else {
            ChainFamily::Eth
        })
    }

    fn sign_message(&self, private_key: &str, message: &str) -> Result<String, KeyringError> {
        let key = parse_private_key(private_key)?;
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|_| KeyringError::InvalidPrivateKey)?;
        mac.update(message.as_bytes());
        Ok(format!("0x{}", hex::encode(mac.finalize().into_bytes())))
    }
}
