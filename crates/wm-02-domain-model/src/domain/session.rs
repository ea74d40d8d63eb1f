//! Lock state and the in-memory vault password.

use super::errors::{DomainError, DomainResult};
use sha2::{Digest, Sha256};

const VERIFIER_DOMAIN: &[u8] = b"wm-session-verifier:";

/// Wallet session.
///
/// The password is held only while unlocked. A salted digest of it is kept
/// for verification once the first password has been set.
pub struct Session {
    locked: bool,
    password: Option<String>,
    verifier: Option<String>,
}

fn verifier_of(password: &str) -> String {
    hex::encode(
        Sha256::new()
            .chain_update(VERIFIER_DOMAIN)
            .chain_update(password.as_bytes())
            .finalize(),
    )
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("locked", &self.locked)
            .field("has_password", &self.verifier.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh wallet starts locked with no password.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locked: true,
            password: None,
            verifier: None,
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn has_password(&self) -> bool {
        self.verifier.is_some()
    }

    /// True if no password is set yet or `password` matches it.
    #[must_use]
    pub fn accepts(&self, password: &str) -> bool {
        self.verifier
            .as_deref()
            .map_or(true, |v| v == verifier_of(password))
    }

    /// Unlock with `password`, adopting it if none is set.
    pub fn unlock(&mut self, password: &str) -> DomainResult<()> {
        if !self.accepts(password) {
            return Err(DomainError::InvalidPassword);
        }
        if self.verifier.is_none() {
            self.verifier = Some(verifier_of(password));
        }
        self.password = Some(password.to_string());
        self.locked = false;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.locked = true;
        self.password = None;
    }

    /// The vault password, available only while unlocked.
    pub fn password(&self) -> DomainResult<String> {
        match (&self.password, self.locked) {
            (Some(password), false) => Ok(password.clone()),
            _ => Err(DomainError::Locked),
        }
    }
}
