//! # Wallet Database Service
//!
//! [`WalletDb`] is the only writer of the entity store. Every state
//! transition is one method here, and every method is one store transaction,
//! so the invariants below hold after any interleaving of requests.
//!
//! ## Invariants
//!
//! | Invariant | Enforced in |
//! |-----------|-------------|
//! | No duplicate credential | `vault.rs` (fingerprint checked inside the import transaction) |
//! | Nicknames unique per group | `vault.rs` via [`check_account_nickname`] |
//! | At most one selected account/network | `select_only` |
//! | One address per account × network | `materialize_address` |
//! | Builtin networks undeletable | `network.rs` |
//! | Grants only grow | `app.rs` |
//!
//! Decryption is async and always happens before the transaction opens;
//! derivation is pure and runs inside it.

mod app;
mod auth;
mod keys;
mod network;
mod queries;
mod session;
mod vault;

pub use network::{NetworkSpec, NetworkUpdate};
pub use vault::{AccountUpdate, GroupUpdate, ImportedVault};

use app::{delete_app_in, revoke_in, site_origin};

use crate::domain::{
    check_account_nickname, default_account_nickname, default_group_nickname, DomainError,
    DomainResult, Session, VaultSecret,
};
use crate::ports::{Keyring, NetworkParams};
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{InMemoryEventBus, WalletEvent};
use shared_types::{Eid, VaultKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use wm_01_entity_store::{
    Account, AccountGroup, Address, App, Attr, AttrName, AuthReq, EntityStore, HdPath, Network,
    Record, Site, StoreError, Tx, Vault,
};

/// Invariant-preserving wallet operations over an [`EntityStore`].
pub struct WalletDb {
    store: Arc<EntityStore>,
    keyring: Arc<dyn Keyring>,
    bus: Option<Arc<InMemoryEventBus>>,
    session: Mutex<Session>,
}

impl WalletDb {
    pub fn new(store: Arc<EntityStore>, keyring: Arc<dyn Keyring>) -> Self {
        Self {
            store,
            keyring,
            bus: None,
            session: Mutex::new(Session::new()),
        }
    }

    /// Publish session changes and site pushes on `bus`.
    #[must_use]
    pub fn with_bus(mut self, bus: Arc<InMemoryEventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    #[must_use]
    pub fn keyring(&self) -> &dyn Keyring {
        self.keyring.as_ref()
    }

    pub(crate) fn emit(&self, event: WalletEvent) {
        if let Some(bus) = &self.bus {
            bus.emit(event);
        }
    }

    /// Push an event to one site's channel.
    pub fn push_to_site(&self, origin: &str, event: &str, params: Value) {
        debug!(origin, event, "Site push");
        self.emit(WalletEvent::site(origin, event, params));
    }

    pub(super) fn password(&self) -> DomainResult<String> {
        self.session.lock().password()
    }

    /// Decrypt one vault.
    pub(super) async fn secret_of(&self, vault_eid: Eid) -> DomainResult<VaultSecret> {
        let vault = self.require::<Vault>(vault_eid)?;
        self.open_vault(&vault).await
    }

    pub(super) async fn open_vault(&self, vault: &Vault) -> DomainResult<VaultSecret> {
        match (&vault.ddata, &vault.address) {
            (Some(ddata), _) => {
                let password = self.password()?;
                let plaintext = self.keyring.decrypt(&password, ddata).await?;
                Ok(VaultSecret::from_plaintext(vault.kind, plaintext))
            }
            (None, Some(address)) => Ok(VaultSecret::Address(address.clone())),
            (None, None) => Err(DomainError::NotAllowed(format!(
                "Vault of kind {:?} holds no credential",
                vault.kind
            ))),
        }
    }

    /// Decrypt every vault. Needs the password as soon as one vault has
    /// secret material.
    pub(super) async fn all_secrets(&self) -> DomainResult<HashMap<Eid, VaultSecret>> {
        let mut secrets = HashMap::new();
        for (eid, vault) in self.store.all::<Vault>() {
            secrets.insert(eid, self.open_vault(&vault).await?);
        }
        Ok(secrets)
    }
}

/// Address encoding parameters of a network.
#[must_use]
pub fn network_params(network: &Network) -> NetworkParams {
    NetworkParams {
        family: network.family,
        net_id: network.net_id,
    }
}

/// Create the address of `account` on `network`, unless it already exists
/// or the account is watch-only for another family.
///
/// Returns the address eid, or `None` when the pair has no address.
pub(crate) fn materialize_address(
    tx: &mut Tx<'_>,
    keyring: &dyn Keyring,
    account_eid: Eid,
    network_eid: Eid,
    secret: &VaultSecret,
) -> DomainResult<Option<Eid>> {
    let existing = tx
        .view()
        .find::<Address, _>(move |a| a.account == account_eid && a.network == network_eid)
        .map(|(eid, _)| eid)
        .next();
    if existing.is_some() {
        return Ok(existing);
    }

    let account = tx.require::<Account>(account_eid)?.clone();
    let group = tx.require::<AccountGroup>(account.group)?;
    let vault = tx.require::<Vault>(group.vault)?;
    let network = tx.require::<Network>(network_eid)?.clone();
    if vault.kind == VaultKind::Pub && vault.family != Some(network.family) {
        return Ok(None);
    }
    let hd_path = tx.require::<HdPath>(network.hd_path)?.value.clone();

    let (forms, _) = secret.derive(keyring, &hd_path, account.index, network_params(&network))?;
    let eid = tx.create(Address {
        account: account_eid,
        network: network_eid,
        index: account.index,
        hex: forms.hex,
        cfx_hex: forms.cfx_hex,
        base32: forms.base32,
        pk: None,
    })?;
    Ok(Some(eid))
}

/// Set `selected` on `target` and clear it on every other row of `T`.
pub(crate) fn select_only<T: Record>(
    tx: &mut Tx<'_>,
    target: Eid,
    is_selected: fn(&T) -> bool,
) -> DomainResult<()> {
    tx.require::<T>(target)?;
    let previous: Vec<Eid> = tx
        .view()
        .find::<T, _>(is_selected)
        .map(|(eid, _)| eid)
        .filter(|eid| *eid != target)
        .collect();
    for eid in previous {
        tx.set(eid, Attr::Selected(false))?;
    }
    tx.set(target, Attr::Selected(true))?;
    Ok(())
}
