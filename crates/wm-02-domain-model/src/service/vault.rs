//! Vault import, account creation and account/group maintenance.

use super::*;
use serde::{Deserialize, Serialize};

/// Entities created by one import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedVault {
    pub vault: Eid,
    pub group: Eid,
    pub account: Eid,
}

/// Mutable account fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub nickname: Option<String>,
    pub hidden: Option<bool>,
}

/// Mutable group fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdate {
    pub nickname: Option<String>,
    pub hidden: Option<bool>,
}

impl WalletDb {
    /// Import an HD mnemonic as a new vault with its first account.
    pub async fn import_mnemonic(
        &self,
        password: &str,
        mnemonic: &str,
        nickname: Option<String>,
    ) -> DomainResult<ImportedVault> {
        let secret = VaultSecret::Mnemonic(mnemonic.split_whitespace().collect::<Vec<_>>().join(" "));
        self.import(password, secret, nickname).await
    }

    /// Import a raw private key.
    pub async fn import_private_key(
        &self,
        password: &str,
        private_key: &str,
        nickname: Option<String>,
    ) -> DomainResult<ImportedVault> {
        let secret = VaultSecret::PrivateKey(private_key.trim().to_string());
        self.import(password, secret, nickname).await
    }

    /// Import a watch-only address. Addresses are created only on networks
    /// of the address's family.
    pub async fn import_address(
        &self,
        password: &str,
        address: &str,
        nickname: Option<String>,
    ) -> DomainResult<ImportedVault> {
        let secret = VaultSecret::Address(address.trim().to_string());
        self.import(password, secret, nickname).await
    }

    async fn import(
        &self,
        password: &str,
        secret: VaultSecret,
        nickname: Option<String>,
    ) -> DomainResult<ImportedVault> {
        self.adopt_password(password)?;

        let kind = secret.kind();
        let fingerprint = self.keyring.fingerprint(&secret.credential(self.keyring())?);
        let (ddata, address, family) = match &secret {
            VaultSecret::Address(addr) => (
                None,
                Some(addr.clone()),
                Some(self.keyring.address_family(addr)?),
            ),
            VaultSecret::Mnemonic(plain) | VaultSecret::PrivateKey(plain) => {
                (Some(self.keyring.encrypt(password, plain).await?), None, None)
            }
        };
        let keyring = self.keyring();

        let imported = self.store.transact_with(|tx| {
            if tx
                .view()
                .find::<Vault, _>(|v| v.fingerprint == fingerprint)
                .next()
                .is_some()
            {
                return Err(DomainError::DuplicateCredential);
            }

            let view = tx.view();
            let ordinal = view
                .find::<AccountGroup, _>(|g| view.get::<Vault>(g.vault).map(|v| v.kind) == Some(kind))
                .count()
                + 1;
            let group_nickname = nickname
                .clone()
                .unwrap_or_else(|| default_group_nickname(kind, ordinal));

            let vault = tx.create(Vault {
                kind,
                ddata: ddata.clone(),
                fingerprint: fingerprint.clone(),
                address: address.clone(),
                family,
            })?;
            let group = tx.create(AccountGroup {
                vault,
                nickname: group_nickname.clone(),
                hidden: false,
            })?;
            let account = create_account_in(tx, keyring, group, 0, &group_nickname, None, &secret)?;
            select_only::<Account>(tx, account, |a| a.selected)?;
            Ok(ImportedVault {
                vault,
                group,
                account,
            })
        })?;

        info!(
            kind = ?kind,
            vault = %imported.vault,
            account = %imported.account,
            "Vault imported"
        );
        self.unlock(password)?;
        Ok(imported)
    }

    /// Derive the next account of an HD group.
    pub async fn create_account(&self, group: Eid, nickname: Option<String>) -> DomainResult<Eid> {
        let group_row = self.require::<AccountGroup>(group)?;
        let vault = self.require::<Vault>(group_row.vault)?;
        if vault.kind != VaultKind::Hd {
            return Err(DomainError::NotAllowed(
                "Can only create account in HD account group".into(),
            ));
        }
        let secret = self.secret_of(group_row.vault).await?;
        let keyring = self.keyring();

        let account = self.store.transact_with(|tx| {
            let group_row = tx.require::<AccountGroup>(group)?.clone();
            let index = tx
                .view()
                .find::<Account, _>(move |a| a.group == group)
                .map(|(_, a)| a.index + 1)
                .max()
                .unwrap_or(0);
            create_account_in(
                tx,
                keyring,
                group,
                index,
                &group_row.nickname,
                nickname.clone(),
                &secret,
            )
        })?;
        info!(group = %group, account = %account, "Account created");
        Ok(account)
    }

    pub fn update_account(&self, account: Eid, update: AccountUpdate) -> DomainResult<()> {
        self.store.transact_with(|tx| {
            let row = tx.require::<Account>(account)?.clone();
            if let Some(nickname) = update.nickname {
                check_account_nickname(tx.view(), row.group, &nickname, Some(account))?;
                tx.set(account, Attr::Nickname(nickname))?;
            }
            if let Some(hidden) = update.hidden {
                if hidden && row.selected {
                    return Err(DomainError::NotAllowed(
                        "Can not hide the selected account".into(),
                    ));
                }
                tx.set(account, Attr::Hidden(hidden))?;
            }
            Ok(())
        })
    }

    pub fn update_account_group(&self, group: Eid, update: GroupUpdate) -> DomainResult<()> {
        self.store.transact_with(|tx| {
            tx.require::<AccountGroup>(group)?;
            if let Some(nickname) = update.nickname {
                if nickname.trim().is_empty() {
                    return Err(DomainError::InvalidNickname(
                        "Invalid nickname, nickname can not be empty".into(),
                    ));
                }
                tx.set(group, Attr::Nickname(nickname))?;
            }
            if let Some(hidden) = update.hidden {
                tx.set(group, Attr::Hidden(hidden))?;
            }
            Ok(())
        })
    }

    /// Delete a group with its vault, accounts and addresses.
    ///
    /// Deleted accounts are revoked from every App; an App left with no
    /// accounts is deleted. If the selected account goes, the first
    /// remaining account is selected.
    pub fn delete_account_group(&self, group: Eid) -> DomainResult<()> {
        let touched_origins = self.store.transact_with::<_, DomainError, _>(|tx| {
            let vault = tx.require::<AccountGroup>(group)?.vault;
            let accounts: Vec<(Eid, bool)> = tx
                .view()
                .find::<Account, _>(move |a| a.group == group)
                .map(|(eid, a)| (eid, a.selected))
                .collect();
            let lost_selection = accounts.iter().any(|(_, selected)| *selected);
            let gone: Vec<Eid> = accounts.iter().map(|(eid, _)| *eid).collect();

            let mut origins = Vec::new();
            let apps: Vec<Eid> = tx
                .view()
                .find::<App, _>(|app| app.accounts.iter().any(|a| gone.contains(a)))
                .map(|(eid, _)| eid)
                .collect();
            for app in apps {
                origins.push(site_origin(tx, app)?);
                for account in &gone {
                    revoke_in(tx, app, *account)?;
                }
                if tx.require::<App>(app)?.accounts.is_empty() {
                    delete_app_in(tx, app)?;
                }
            }

            let addresses: Vec<Eid> = tx
                .view()
                .find::<Address, _>(|a| gone.contains(&a.account))
                .map(|(eid, _)| eid)
                .collect();
            for eid in addresses.into_iter().chain(gone.iter().copied()) {
                tx.delete(eid)?;
            }
            tx.delete(group)?;
            tx.delete(vault)?;

            if lost_selection {
                let next = tx.view().all::<Account>().map(|(eid, _)| eid).next();
                if let Some(next) = next {
                    select_only::<Account>(tx, next, |a| a.selected)?;
                }
            }
            Ok(origins)
        })?;

        info!(group = %group, "Account group deleted");
        for origin in touched_origins {
            self.push_to_site(&origin, "accountsChanged", self.site_accounts_value(&origin));
        }
        Ok(())
    }
}

/// Create an account at `index` with addresses on every network.
pub(super) fn create_account_in(
    tx: &mut Tx<'_>,
    keyring: &dyn Keyring,
    group: Eid,
    index: u32,
    group_nickname: &str,
    nickname: Option<String>,
    secret: &VaultSecret,
) -> DomainResult<Eid> {
    let nickname = nickname.unwrap_or_else(|| default_account_nickname(group_nickname, index));
    check_account_nickname(tx.view(), group, &nickname, None)?;

    let account = tx.create(Account {
        group,
        index,
        nickname,
        hidden: false,
        selected: false,
    })?;
    let networks: Vec<Eid> = tx.view().all::<Network>().map(|(eid, _)| eid).collect();
    for network in networks {
        materialize_address(tx, keyring, account, network, secret)?;
    }
    Ok(account)
}
