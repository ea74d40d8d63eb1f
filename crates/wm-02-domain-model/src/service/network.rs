//! Network lifecycle and selection.

use super::*;
use serde::{Deserialize, Serialize};
use shared_types::{ChainFamily, Ticker};

/// Everything needed to add a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    pub name: String,
    pub family: ChainFamily,
    pub chain_id: String,
    pub net_id: u64,
    pub endpoint: String,
    pub ticker: Ticker,
    /// Derivation path value, e.g. `m/44'/503'/0'/0`. Shared by networks
    /// that name the same path.
    pub hd_path: String,
    #[serde(default)]
    pub builtin: bool,
}

/// Mutable network fields. Builtin networks accept only `endpoint`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkUpdate {
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub chain_id: Option<String>,
    pub ticker: Option<Ticker>,
}

impl WalletDb {
    /// Add a network and derive an address on it for every account.
    ///
    /// The first network ever added becomes the selected one.
    pub async fn create_network(&self, spec: NetworkSpec) -> DomainResult<Eid> {
        if spec.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Invalid network name".into()));
        }
        let secrets = self.all_secrets().await?;
        let keyring = self.keyring();

        let network = self.store.transact_with(|tx| {
            if tx.view().find::<Network, _>(|n| n.name == spec.name).next().is_some() {
                return Err(DomainError::DuplicateNetwork(spec.name.clone()));
            }
            let existing_path = tx
                .view()
                .find::<HdPath, _>(|p| p.value == spec.hd_path)
                .map(|(eid, _)| eid)
                .next();
            let hd_path = match existing_path {
                Some(eid) => eid,
                None => tx.create(HdPath {
                    name: format!("{}-path", spec.family),
                    value: spec.hd_path.clone(),
                })?,
            };
            let first = tx.view().count::<Network>() == 0;
            let network = tx.create(Network {
                name: spec.name.clone(),
                family: spec.family,
                chain_id: spec.chain_id.clone(),
                net_id: spec.net_id,
                endpoint: spec.endpoint.clone(),
                ticker: spec.ticker.clone(),
                hd_path,
                builtin: spec.builtin,
                selected: first,
            })?;

            let accounts: Vec<(Eid, Eid)> = tx
                .view()
                .all::<Account>()
                .filter_map(|(eid, a)| {
                    let group = tx.view().get::<AccountGroup>(a.group)?;
                    Some((eid, group.vault))
                })
                .collect();
            for (account, vault) in accounts {
                let secret = secrets.get(&vault).ok_or(StoreError::NotFound(vault))?;
                materialize_address(tx, keyring, account, network, secret)?;
            }
            Ok(network)
        })?;

        info!(name = %spec.name, family = %spec.family, network = %network, "Network added");
        Ok(network)
    }

    pub fn update_network(&self, network: Eid, update: NetworkUpdate) -> DomainResult<()> {
        self.store.transact_with(|tx| {
            let row = tx.require::<Network>(network)?.clone();
            let touches_identity =
                update.name.is_some() || update.chain_id.is_some() || update.ticker.is_some();
            if row.builtin && touches_identity {
                return Err(DomainError::BuiltinProtected(format!(
                    "Builtin network {} can not be modified",
                    row.name
                )));
            }
            if let Some(name) = update.name {
                if name.trim().is_empty() {
                    return Err(DomainError::InvalidInput("Invalid network name".into()));
                }
                let taken = tx
                    .view()
                    .find::<Network, _>(|n| n.name == name)
                    .any(|(eid, _)| eid != network);
                if taken {
                    return Err(DomainError::DuplicateNetwork(name));
                }
                tx.set(network, Attr::Name(name))?;
            }
            if let Some(endpoint) = update.endpoint {
                tx.set(network, Attr::Endpoint(endpoint))?;
            }
            if let Some(chain_id) = update.chain_id {
                tx.set(network, Attr::ChainId(chain_id))?;
            }
            if let Some(ticker) = update.ticker {
                tx.set(network, Attr::Ticker(ticker))?;
            }
            Ok(())
        })
    }

    /// Delete a non-builtin network and its addresses. Accounts stay.
    ///
    /// Apps on the deleted network move to the selected network; if the
    /// deleted network was selected, the first remaining one is selected.
    pub fn delete_network(&self, network: Eid) -> DomainResult<()> {
        let moved = self.store.transact_with::<_, DomainError, _>(|tx| {
            let row = tx.require::<Network>(network)?.clone();
            if row.builtin {
                return Err(DomainError::BuiltinProtected(format!(
                    "Builtin network {} can not be deleted",
                    row.name
                )));
            }

            let addresses: Vec<Eid> = tx
                .view()
                .find::<Address, _>(move |a| a.network == network)
                .map(|(eid, _)| eid)
                .collect();
            for eid in addresses {
                tx.delete(eid)?;
            }

            let fallback = if row.selected {
                tx.view()
                    .all::<Network>()
                    .map(|(eid, _)| eid)
                    .find(|eid| *eid != network)
            } else {
                tx.view()
                    .find::<Network, _>(|n| n.selected)
                    .map(|(eid, _)| eid)
                    .next()
            };

            let stranded: Vec<Eid> = tx
                .view()
                .find::<App, _>(move |app| app.current_network == network)
                .map(|(eid, _)| eid)
                .collect();
            let mut moved = Vec::new();
            if !stranded.is_empty() {
                let Some(fallback) = fallback else {
                    return Err(DomainError::NotAllowed(
                        "Can not delete the last network used by an app".into(),
                    ));
                };
                for app in stranded {
                    tx.set(app, Attr::CurrentNetwork(fallback))?;
                    moved.push(site_origin(tx, app)?);
                }
            }

            tx.delete(network)?;
            if row.selected {
                if let Some(fallback) = fallback {
                    select_only::<Network>(tx, fallback, |n| n.selected)?;
                }
            }
            Ok(moved)
        })?;

        info!(network = %network, "Network deleted");
        for origin in moved {
            self.push_chain_changed(&origin);
        }
        Ok(())
    }

    /// Ensure `account` has an address on `network`.
    ///
    /// Returns the existing or new address, or `None` for a watch-only
    /// account on a network of another family.
    pub async fn add_address_for_network(
        &self,
        account: Eid,
        network: Eid,
    ) -> DomainResult<Option<Eid>> {
        if let Some((eid, _)) = self.account_address_on_network(account, network) {
            return Ok(Some(eid));
        }
        let group = self.require::<AccountGroup>(self.require::<Account>(account)?.group)?;
        let secret = self.secret_of(group.vault).await?;
        let keyring = self.keyring();
        self.store
            .transact_with(|tx| materialize_address(tx, keyring, account, network, &secret))
    }

    /// Make `network` the wallet's selected network and every App's
    /// current network.
    pub fn set_selected_network(&self, network: Eid) -> DomainResult<()> {
        let origins = self.store.transact_with::<_, DomainError, _>(|tx| {
            select_only::<Network>(tx, network, |n| n.selected)?;
            let apps: Vec<Eid> = tx.view().all::<App>().map(|(eid, _)| eid).collect();
            let mut origins = Vec::new();
            for app in apps {
                if tx.require::<App>(app)?.current_network != network {
                    tx.set(app, Attr::CurrentNetwork(network))?;
                    origins.push(site_origin(tx, app)?);
                }
            }
            Ok(origins)
        })?;

        debug!(network = %network, apps = origins.len(), "Network selected");
        for origin in origins {
            self.push_chain_changed(&origin);
        }
        Ok(())
    }

    /// Push `chainChanged` with the chain id of the site's current network.
    pub(super) fn push_chain_changed(&self, origin: &str) {
        let chain_id = self
            .app_for_origin(origin)
            .and_then(|(_, app)| self.store.get::<Network>(app.current_network))
            .map(|n| Value::String(n.chain_id))
            .unwrap_or(Value::Null);
        self.push_to_site(origin, "chainChanged", chain_id);
    }
}
