//! Domain model error types.

use crate::ports::KeyringError;
use shared_types::RpcError;
use thiserror::Error;
use wm_01_entity_store::StoreError;

/// Errors from wallet mutations and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Keyring(#[from] KeyringError),

    /// Another vault already holds the same mnemonic, key or address.
    #[error("Duplicate credential")]
    DuplicateCredential,

    #[error("{0}")]
    InvalidNickname(String),

    #[error("{0}")]
    BuiltinProtected(String),

    #[error("{0}")]
    NotAllowed(String),

    #[error("Invalid password")]
    InvalidPassword,

    /// An operation needs the vault password but the wallet is locked.
    #[error("Wallet is locked")]
    Locked,

    #[error("Duplicate network name {0}")]
    DuplicateNetwork(String),

    #[error("{0}")]
    InvalidInput(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<DomainError> for RpcError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Store(e) => e.into(),
            DomainError::Keyring(KeyringError::InvalidPassword) | DomainError::InvalidPassword => {
                RpcError::invalid_params("Invalid password")
            }
            DomainError::Keyring(e) => RpcError::invalid_params(e.to_string()),
            DomainError::DuplicateCredential => RpcError::duplicate_credential(),
            DomainError::InvalidNickname(msg) => RpcError::invalid_nickname(msg),
            DomainError::BuiltinProtected(msg) => RpcError::builtin_protected(msg),
            DomainError::NotAllowed(msg) => RpcError::not_allowed(msg),
            DomainError::Locked => RpcError::unauthorized("Wallet is locked"),
            e @ (DomainError::DuplicateNetwork(_) | DomainError::InvalidInput(_)) => {
                RpcError::invalid_params(e.to_string())
            }
        }
    }
}
