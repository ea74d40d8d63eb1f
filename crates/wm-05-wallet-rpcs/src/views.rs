//! Response shapes returned to the popup and to pages.

use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{ChainFamily, Eid, Permission, VaultKind};
use std::collections::BTreeSet;
use wm_01_entity_store::{Account, AccountGroup, Address, App, Network, Site, Vault};
use wm_02_domain_model::WalletDb;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressView {
    pub eid: Eid,
    pub network: Eid,
    /// Base32 on cfx networks, hex elsewhere.
    pub value: String,
    pub hex: String,
    pub base32: Option<String>,
}

impl AddressView {
    pub fn new(eid: Eid, address: &Address) -> Self {
        Self {
            eid,
            network: address.network,
            value: address.value().to_string(),
            hex: address.hex.clone(),
            base32: address.base32.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub eid: Eid,
    pub group: Eid,
    pub index: u32,
    pub nickname: String,
    pub hidden: bool,
    pub selected: bool,
    pub addresses: Vec<AddressView>,
}

impl AccountView {
    /// Account with its address on `network` only.
    pub fn on_network(db: &WalletDb, eid: Eid, account: Account, network: Eid) -> Self {
        let addresses = db
            .account_address_on_network(eid, network)
            .map(|(addr, row)| AddressView::new(addr, &row))
            .into_iter()
            .collect();
        Self::with_addresses(eid, account, addresses)
    }

    /// Account with every address it has.
    pub fn everywhere(db: &WalletDb, eid: Eid, account: Account) -> Self {
        let addresses = db
            .account_addresses(eid)
            .iter()
            .map(|(addr, row)| AddressView::new(*addr, row))
            .collect();
        Self::with_addresses(eid, account, addresses)
    }

    fn with_addresses(eid: Eid, account: Account, addresses: Vec<AddressView>) -> Self {
        Self {
            eid,
            group: account.group,
            index: account.index,
            nickname: account.nickname,
            hidden: account.hidden,
            selected: account.selected,
            addresses,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub eid: Eid,
    pub vault: Eid,
    #[serde(rename = "vaultType")]
    pub kind: VaultKind,
    pub nickname: String,
    pub hidden: bool,
    pub accounts: Vec<AccountView>,
}

impl GroupView {
    pub fn new(eid: Eid, group: AccountGroup, kind: VaultKind, accounts: Vec<AccountView>) -> Self {
        Self {
            eid,
            vault: group.vault,
            kind,
            nickname: group.nickname,
            hidden: group.hidden,
            accounts,
        }
    }
}

/// Vault summary. Never carries secret material.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultView {
    pub eid: Eid,
    #[serde(rename = "type")]
    pub kind: VaultKind,
    pub address: Option<String>,
    pub family: Option<ChainFamily>,
    pub groups: Vec<Eid>,
}

impl VaultView {
    pub fn new(db: &WalletDb, eid: Eid, vault: Vault) -> Self {
        Self {
            eid,
            kind: vault.kind,
            address: vault.address,
            family: vault.family,
            groups: db.vault_groups(eid).into_iter().map(|(g, _)| g).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkView {
    pub eid: Eid,
    #[serde(flatten)]
    pub network: Network,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppView {
    pub eid: Eid,
    pub site: SiteView,
    pub perms: Vec<&'static str>,
    pub accounts: Vec<Eid>,
    pub current_account: Option<Eid>,
    pub current_network: Eid,
    pub created_at: i64,
    /// Addresses the site sees, current account first.
    pub addresses: Vec<String>,
}

impl AppView {
    pub fn new(db: &WalletDb, eid: Eid, app: App, site: Site) -> Self {
        Self {
            eid,
            site: SiteView {
                eid: app.site,
                site,
            },
            perms: app.perms.iter().map(|p| p.name()).collect(),
            accounts: app.accounts,
            current_account: app.current_account,
            current_network: app.current_network,
            created_at: app.created_at,
            addresses: db.app_addresses(eid),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub eid: Eid,
    #[serde(flatten)]
    pub site: Site,
}

/// Permission list in the `[{parentCapability}]` form pages expect.
#[must_use]
pub fn permissions_value(perms: &BTreeSet<Permission>) -> Value {
    Value::Array(
        perms
            .iter()
            .map(|p| json!({ "parentCapability": p.name() }))
            .collect(),
    )
}
