//! Read-only lookups.

use super::*;

impl WalletDb {
    /// Typed lookup failing with `NotFound`/`WrongKind`.
    pub fn require<T: Record>(&self, eid: Eid) -> DomainResult<T> {
        self.store.read(|view| match view.get::<T>(eid) {
            Some(row) => Ok(row.clone()),
            None => Err(match view.kind(eid) {
                Some(actual) => StoreError::WrongKind {
                    eid,
                    expected: T::KIND,
                    actual,
                },
                None => StoreError::NotFound(eid),
            }
            .into()),
        })
    }

    #[must_use]
    pub fn get<T: Record>(&self, eid: Eid) -> Option<T> {
        self.store.get::<T>(eid)
    }

    #[must_use]
    pub fn all<T: Record>(&self) -> Vec<(Eid, T)> {
        self.store.all::<T>()
    }

    #[must_use]
    pub fn site_by_origin(&self, origin: &str) -> Option<(Eid, Site)> {
        self.store
            .find::<Site, _>(|s| s.origin == origin)
            .into_iter()
            .next()
    }

    #[must_use]
    pub fn app_for_site(&self, site: Eid) -> Option<(Eid, App)> {
        self.store.find::<App, _>(|a| a.site == site).into_iter().next()
    }

    #[must_use]
    pub fn app_for_origin(&self, origin: &str) -> Option<(Eid, App)> {
        let (site, _) = self.site_by_origin(origin)?;
        self.app_for_site(site)
    }

    #[must_use]
    pub fn network_by_name(&self, name: &str) -> Option<(Eid, Network)> {
        self.store
            .find::<Network, _>(|n| n.name == name)
            .into_iter()
            .next()
    }

    #[must_use]
    pub fn selected_network(&self) -> Option<(Eid, Network)> {
        self.store.find::<Network, _>(|n| n.selected).into_iter().next()
    }

    #[must_use]
    pub fn selected_account(&self) -> Option<(Eid, Account)> {
        self.store.find::<Account, _>(|a| a.selected).into_iter().next()
    }

    #[must_use]
    pub fn group_accounts(&self, group: Eid) -> Vec<(Eid, Account)> {
        self.store.find::<Account, _>(|a| a.group == group)
    }

    #[must_use]
    pub fn vault_groups(&self, vault: Eid) -> Vec<(Eid, AccountGroup)> {
        self.store.find::<AccountGroup, _>(|g| g.vault == vault)
    }

    #[must_use]
    pub fn account_addresses(&self, account: Eid) -> Vec<(Eid, Address)> {
        self.store.find::<Address, _>(|a| a.account == account)
    }

    #[must_use]
    pub fn account_address_on_network(&self, account: Eid, network: Eid) -> Option<(Eid, Address)> {
        self.store
            .find::<Address, _>(|a| a.account == account && a.network == network)
            .into_iter()
            .next()
    }

    /// Vault kind behind an account.
    #[must_use]
    pub fn account_vault_kind(&self, account: Eid) -> Option<VaultKind> {
        self.store.read(|view| {
            let group = view.get::<Account>(account)?.group;
            let vault = view.get::<AccountGroup>(group)?.vault;
            view.get::<Vault>(vault).map(|v| v.kind)
        })
    }

    /// Address values an App exposes on its current network, current
    /// account first.
    #[must_use]
    pub fn app_addresses(&self, app: Eid) -> Vec<String> {
        self.store.read(|view| {
            let Some(row) = view.get::<App>(app) else {
                return Vec::new();
            };
            let ordered = row
                .current_account
                .into_iter()
                .chain(row.accounts.iter().copied().filter(|a| Some(*a) != row.current_account));
            ordered
                .filter_map(|account| {
                    view.find::<Address, _>(move |a| {
                        a.account == account && a.network == row.current_network
                    })
                    .map(|(_, a)| a.value().to_string())
                    .next()
                })
                .collect()
        })
    }

    /// `accountsChanged` payload for one origin.
    #[must_use]
    pub fn site_accounts_value(&self, origin: &str) -> Value {
        let addresses = self
            .app_for_origin(origin)
            .map(|(app, _)| self.app_addresses(app))
            .unwrap_or_default();
        Value::Array(addresses.into_iter().map(Value::String).collect())
    }
}
