//! Nickname defaults and uniqueness rules.

use super::errors::{DomainError, DomainResult};
use shared_types::{Eid, VaultKind};
use wm_01_entity_store::{Account, Tables};

/// Default nickname for the `ordinal`-th group of a vault kind (1-based).
#[must_use]
pub fn default_group_nickname(kind: VaultKind, ordinal: usize) -> String {
    let prefix = match kind {
        VaultKind::Hd => "Seed",
        VaultKind::Pk => "Key",
        VaultKind::Pub => "Watch",
    };
    format!("{prefix}-{ordinal}")
}

/// Default nickname of the account at `index` in a group.
#[must_use]
pub fn default_account_nickname(group_nickname: &str, index: u32) -> String {
    format!("{group_nickname}-{}", index + 1)
}

/// Reject empty nicknames and exact duplicates within `group`.
///
/// `except` is the account being renamed, which may keep its own name.
pub fn check_account_nickname(
    view: &Tables,
    group: Eid,
    nickname: &str,
    except: Option<Eid>,
) -> DomainResult<()> {
    if nickname.trim().is_empty() {
        return Err(DomainError::InvalidNickname(
            "Invalid nickname, nickname can not be empty".into(),
        ));
    }
    let taken = view
        .find::<Account, _>(move |a| a.group == group && a.nickname == nickname)
        .any(|(eid, _)| Some(eid) != except);
    if taken {
        return Err(DomainError::InvalidNickname(format!(
            "Invalid nickname \"{nickname}\", duplicate with other account in the same account group"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wm_01_entity_store::{AccountGroup, EntityStore, Vault};

    fn seed(store: &EntityStore) -> (Eid, Eid) {
        store
            .transact_with::<_, DomainError, _>(|tx| {
                let vault = tx.create(Vault {
                    kind: VaultKind::Pk,
                    ddata: Some("c".into()),
                    fingerprint: "fp".into(),
                    address: None,
                    family: None,
                })?;
                let mut groups = Vec::new();
                for nickname in ["Key-1", "Key-2"] {
                    let group = tx.create(AccountGroup {
                        vault,
                        nickname: nickname.into(),
                        hidden: false,
                    })?;
                    tx.create(Account {
                        group,
                        index: 0,
                        nickname: "alice".into(),
                        hidden: false,
                        selected: false,
                    })?;
                    groups.push(group);
                }
                Ok((groups[0], groups[1]))
            })
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_group_nickname(VaultKind::Hd, 2), "Seed-2");
        assert_eq!(default_group_nickname(VaultKind::Pub, 1), "Watch-1");
        assert_eq!(default_account_nickname("Seed-2", 0), "Seed-2-1");
    }

    #[test]
    fn test_duplicates_are_case_sensitive_and_group_scoped() {
        let store = EntityStore::new();
        let (first, _) = seed(&store);

        store.read(|view| {
            assert!(matches!(
                check_account_nickname(view, first, "alice", None),
                Err(DomainError::InvalidNickname(_))
            ));
            assert!(check_account_nickname(view, first, "Alice", None).is_ok());
            assert!(check_account_nickname(view, first, "  ", None).is_err());
        });
    }

    #[test]
    fn test_rename_may_keep_own_name() {
        let store = EntityStore::new();
        let (first, _) = seed(&store);
        let own = store
            .find::<Account, _>(|a| a.group == first)
            .first()
            .map(|(eid, _)| *eid);

        store.read(|view| {
            assert!(check_account_nickname(view, first, "alice", own).is_ok());
        });
    }
}
