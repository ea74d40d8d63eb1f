//! Private key access and message signing.

use super::*;

impl WalletDb {
    /// Private key of an address.
    ///
    /// Served from the cache when present; otherwise recomputed from the
    /// owning vault and cached. Watch-only vaults fail with `NotAllowed`.
    pub async fn address_private_key(&self, address: Eid) -> DomainResult<String> {
        let row = self.require::<Address>(address)?;
        if let Some(pk) = row.pk {
            return Ok(pk);
        }

        let account = self.require::<Account>(row.account)?;
        let group = self.require::<AccountGroup>(account.group)?;
        let vault = self.require::<Vault>(group.vault)?;
        if !vault.kind.has_secret() {
            return Err(DomainError::NotAllowed(
                "Not allowed to get private key of pub account".into(),
            ));
        }
        let network = self.require::<Network>(row.network)?;
        let hd_path = self.require::<HdPath>(network.hd_path)?.value;

        let secret = self.open_vault(&vault).await?;
        let (_, pk) = secret.derive(self.keyring(), &hd_path, row.index, network_params(&network))?;
        let pk = pk.ok_or_else(|| {
            DomainError::NotAllowed("Not allowed to get private key of pub account".into())
        })?;

        // A lock that raced the decryption has already evicted the cache.
        if !self.is_locked() {
            self.store
                .transact_with::<_, DomainError, _>(|tx| {
                    tx.set(address, Attr::PrivateKey(pk.clone()))?;
                    Ok(())
                })?;
        }
        Ok(pk)
    }

    /// Sign a personal message with the key of `address`.
    pub async fn sign_message(&self, address: Eid, message: &str) -> DomainResult<String> {
        let pk = self.address_private_key(address).await?;
        Ok(self.keyring.sign_message(&pk, message)?)
    }

    /// User-facing address the next account of an HD group would get on
    /// `network`, without creating anything.
    pub async fn next_account_address(&self, group: Eid, network: Eid) -> DomainResult<String> {
        let group_row = self.require::<AccountGroup>(group)?;
        let vault = self.require::<Vault>(group_row.vault)?;
        if vault.kind != VaultKind::Hd {
            return Err(DomainError::NotAllowed(
                "Can only discover accounts of HD account group".into(),
            ));
        }
        let network_row = self.require::<Network>(network)?;
        let hd_path = self.require::<HdPath>(network_row.hd_path)?.value;
        let index = self
            .group_accounts(group)
            .iter()
            .map(|(_, a)| a.index + 1)
            .max()
            .unwrap_or(0);

        let secret = self.open_vault(&vault).await?;
        let (forms, _) = secret.derive(self.keyring(), &hd_path, index, network_params(&network_row))?;
        Ok(forms.base32.unwrap_or(forms.hex))
    }
}
