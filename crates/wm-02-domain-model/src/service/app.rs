//! Sites, App grants and account selection.

use super::*;
use shared_types::Permission;
use std::collections::BTreeSet;

impl WalletDb {
    /// Find or create the Site for `origin`, refreshing its metadata.
    ///
    /// Returns the site eid and whether it was created.
    pub fn upsert_site(
        &self,
        origin: &str,
        name: Option<String>,
        icon: Option<String>,
    ) -> DomainResult<(Eid, bool)> {
        if origin.is_empty() {
            return Err(DomainError::InvalidInput("Invalid origin".into()));
        }
        self.store.transact_with(|tx| {
            let existing = tx
                .view()
                .find::<Site, _>(|s| s.origin == origin)
                .map(|(eid, _)| eid)
                .next();
            match existing {
                Some(site) => {
                    if let Some(name) = name {
                        tx.set(site, Attr::Name(name))?;
                    }
                    if let Some(icon) = icon {
                        tx.set(site, Attr::Icon(icon))?;
                    }
                    Ok((site, false))
                }
                None => {
                    let site = tx.create(Site {
                        origin: origin.to_string(),
                        name,
                        icon,
                    })?;
                    Ok((site, true))
                }
            }
        })
    }

    /// Grant `perms` and `accounts` to the site's App, creating it if needed.
    ///
    /// Grants only ever add: existing permissions and accounts are kept,
    /// new accounts are appended in grant order. The first granted account
    /// becomes current if the App has none.
    pub fn grant_or_merge_app(
        &self,
        site: Eid,
        perms: &BTreeSet<Permission>,
        accounts: &[Eid],
    ) -> DomainResult<Eid> {
        let (app, created) = self.store.transact_with::<_, DomainError, _>(|tx| {
            tx.require::<Site>(site)?;
            for account in accounts {
                tx.require::<Account>(*account)?;
            }

            let existing = tx
                .view()
                .find::<App, _>(move |a| a.site == site)
                .map(|(eid, a)| (eid, a.clone()))
                .next();
            let Some((app, row)) = existing else {
                let network = tx
                    .view()
                    .find::<Network, _>(|n| n.selected)
                    .map(|(eid, _)| eid)
                    .next()
                    .ok_or_else(|| DomainError::InvalidInput("No network selected".into()))?;
                let mut granted = Vec::new();
                for account in accounts {
                    if !granted.contains(account) {
                        granted.push(*account);
                    }
                }
                let app = tx.create(App {
                    site,
                    perms: perms.clone(),
                    current_account: granted.first().copied(),
                    accounts: granted,
                    current_network: network,
                    created_at: chrono::Utc::now().timestamp_millis(),
                })?;
                return Ok((app, true));
            };

            let merged: BTreeSet<Permission> = row.perms.union(perms).copied().collect();
            if merged != row.perms {
                tx.set(app, Attr::Permissions(merged))?;
            }
            let mut authorized = row.accounts.clone();
            for account in accounts {
                if !authorized.contains(account) {
                    authorized.push(*account);
                }
            }
            if authorized != row.accounts {
                tx.set(app, Attr::Accounts(authorized))?;
            }
            if row.current_account.is_none() {
                if let Some(first) = accounts.first() {
                    tx.set(app, Attr::CurrentAccount(*first))?;
                }
            }
            Ok((app, false))
        })?;

        info!(site = %site, app = %app, created, accounts = accounts.len(), "App granted");
        Ok(app)
    }

    /// Switch the App's current account. No-op unless `account` is one of
    /// its authorized accounts; returns whether anything changed.
    pub fn set_app_current_account(&self, app: Eid, account: Eid) -> DomainResult<bool> {
        let changed = self.store.transact_with::<_, DomainError, _>(|tx| {
            let row = tx.require::<App>(app)?;
            if !row.accounts.contains(&account) || row.current_account == Some(account) {
                return Ok(false);
            }
            tx.set(app, Attr::CurrentAccount(account))?;
            Ok(true)
        })?;
        if changed {
            let origin = self.store.read(|view| {
                view.get::<App>(app)
                    .and_then(|a| view.get::<Site>(a.site))
                    .map(|s| s.origin.clone())
            });
            if let Some(origin) = origin {
                self.push_to_site(&origin, "accountsChanged", self.site_accounts_value(&origin));
            }
        }
        Ok(changed)
    }

    pub fn set_app_current_network(&self, app: Eid, network: Eid) -> DomainResult<()> {
        let origin = self.store.transact_with::<_, DomainError, _>(|tx| {
            tx.require::<Network>(network)?;
            tx.set(app, Attr::CurrentNetwork(network))?;
            site_origin(tx, app)
        })?;
        self.push_chain_changed(&origin);
        Ok(())
    }

    /// Remove the App, revoking everything it was granted.
    pub fn delete_app(&self, app: Eid) -> DomainResult<()> {
        let origin = self.store.transact_with::<_, DomainError, _>(|tx| {
            let origin = site_origin(tx, app)?;
            delete_app_in(tx, app)?;
            Ok(origin)
        })?;
        info!(app = %app, origin = %origin, "App deleted");
        self.push_to_site(&origin, "accountsChanged", Value::Array(Vec::new()));
        Ok(())
    }

    /// Remove one account from the App's authorized set.
    pub fn revoke_account_from_app(&self, app: Eid, account: Eid) -> DomainResult<()> {
        let origin = self.store.transact_with::<_, DomainError, _>(|tx| {
            revoke_in(tx, app, account)?;
            site_origin(tx, app)
        })?;
        self.push_to_site(&origin, "accountsChanged", self.site_accounts_value(&origin));
        Ok(())
    }

    // =========================================================================
    // ACCOUNT SELECTION
    // =========================================================================

    /// Make `account` the globally selected account.
    ///
    /// Every App that has the account authorized switches its current
    /// account to it.
    pub fn set_selected_account(&self, account: Eid) -> DomainResult<()> {
        let origins = self.store.transact_with::<_, DomainError, _>(|tx| {
            select_only::<Account>(tx, account, |a| a.selected)?;
            let apps: Vec<Eid> = tx
                .view()
                .find::<App, _>(move |a| {
                    a.accounts.contains(&account) && a.current_account != Some(account)
                })
                .map(|(eid, _)| eid)
                .collect();
            let mut origins = Vec::new();
            for app in apps {
                tx.set(app, Attr::CurrentAccount(account))?;
                origins.push(site_origin(tx, app)?);
            }
            Ok(origins)
        })?;

        debug!(account = %account, apps = origins.len(), "Account selected");
        for origin in origins {
            self.push_to_site(&origin, "accountsChanged", self.site_accounts_value(&origin));
        }
        Ok(())
    }
}

/// Origin of the site an App belongs to.
pub(super) fn site_origin(tx: &Tx<'_>, app: Eid) -> DomainResult<String> {
    let site = tx.require::<App>(app)?.site;
    Ok(tx.require::<Site>(site)?.origin.clone())
}

/// Drop `account` from an App, moving the current account to the first
/// remaining one (or clearing it).
pub(super) fn revoke_in(tx: &mut Tx<'_>, app: Eid, account: Eid) -> DomainResult<()> {
    let row = tx.require::<App>(app)?.clone();
    if !row.accounts.contains(&account) {
        return Ok(());
    }
    let remaining: Vec<Eid> = row.accounts.into_iter().filter(|a| *a != account).collect();
    if row.current_account == Some(account) {
        match remaining.first() {
            Some(next) => tx.set(app, Attr::CurrentAccount(*next))?,
            None => tx.retract(app, AttrName::CurrentAccount)?,
        }
    }
    tx.set(app, Attr::Accounts(remaining))?;
    Ok(())
}

/// Delete an App and any resolved consent request that still points at it.
pub(super) fn delete_app_in(tx: &mut Tx<'_>, app: Eid) -> DomainResult<()> {
    tx.require::<App>(app)?;
    let outcomes: Vec<Eid> = tx
        .view()
        .referrers::<AuthReq>(app);
    for auth_req in outcomes {
        tx.delete(auth_req)?;
    }
    tx.delete(app)?;
    Ok(())
}
