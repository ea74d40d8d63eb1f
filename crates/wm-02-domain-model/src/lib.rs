//! # wm-02-domain-model
//!
//! Typed wallet model and its invariant-checked mutations.
//!
//! ## Role in System
//!
//! - **Sole writer** of the entity store: RPC handlers never issue raw
//!   attribute writes, they call [`WalletDb`] operations.
//! - **Session owner**: holds the lock state and the in-memory password that
//!   decrypts vaults.
//! - **Keyring consumer**: encryption, derivation and address encoding sit
//!   behind the [`ports::Keyring`] port. [`adapters::HashKeyring`] is the
//!   deterministic implementation used by the runtime and the tests.
//!
//! ## Operations
//!
//! | Area | Methods |
//! |------|---------|
//! | Session | `is_locked`, `unlock`, `lock`, `verify_password` |
//! | Vaults | `import_mnemonic`, `import_private_key`, `import_address`, `delete_account_group` |
//! | Accounts | `create_account`, `update_account`, `update_account_group`, `set_selected_account` |
//! | Networks | `create_network`, `update_network`, `delete_network`, `add_address_for_network`, `set_selected_network` |
//! | Apps | `upsert_site`, `grant_or_merge_app`, `set_app_current_account`, `set_app_current_network`, `delete_app`, `revoke_account_from_app` |
//! | Consent | `create_auth_req`, `pending_auth_reqs`, `finish_auth_req`, `delete_auth_req` |
//! | Keys | `address_private_key`, `sign_message` |

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::HashKeyring;
pub use domain::{DomainError, DomainResult, VaultSecret};
pub use ports::{Keyring, KeyringError};
pub use service::{
    network_params, AccountUpdate, GroupUpdate, ImportedVault, NetworkSpec, NetworkUpdate,
    WalletDb,
};
