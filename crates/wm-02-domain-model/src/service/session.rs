//! Lock, unlock and password checks.

use super::*;

impl WalletDb {
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.session.lock().is_locked()
    }

    /// True once any password has been adopted.
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.session.lock().has_password()
    }

    /// Unlock the wallet. The first unlock adopts `password`.
    pub fn unlock(&self, password: &str) -> DomainResult<()> {
        let was_locked = {
            let mut session = self.session.lock();
            let was_locked = session.is_locked();
            session.unlock(password)?;
            was_locked
        };
        if was_locked {
            info!("Wallet unlocked");
            self.emit(WalletEvent::LockChanged { locked: false });
        }
        Ok(())
    }

    /// Lock the wallet and evict every cached private key.
    pub fn lock(&self) -> DomainResult<()> {
        self.session.lock().lock();
        let evicted = self.store.transact_with::<_, DomainError, _>(|tx| {
            let cached: Vec<Eid> = tx
                .view()
                .find::<Address, _>(|a| a.pk.is_some())
                .map(|(eid, _)| eid)
                .collect();
            for eid in &cached {
                tx.retract(*eid, AttrName::PrivateKey)?;
            }
            Ok(cached.len())
        })?;
        info!(evicted, "Wallet locked");
        self.emit(WalletEvent::LockChanged { locked: true });
        Ok(())
    }

    /// Check `password` without changing the lock state.
    pub fn verify_password(&self, password: &str) -> DomainResult<()> {
        let session = self.session.lock();
        if session.has_password() && session.accepts(password) {
            Ok(())
        } else {
            Err(DomainError::InvalidPassword)
        }
    }

    /// Accept `password` for an import: it must match the current one, or
    /// become the password if none is set.
    pub(super) fn adopt_password(&self, password: &str) -> DomainResult<()> {
        if self.session.lock().accepts(password) {
            Ok(())
        } else {
            Err(DomainError::InvalidPassword)
        }
    }
}
