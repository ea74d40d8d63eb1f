//! # Builtin Network Bootstrap
//!
//! Creates the configured builtin networks that do not exist yet and selects
//! the primary network when the wallet starts with none.

use crate::config::BuiltinNetwork;
use tracing::info;
use wm_02_domain_model::{DomainError, WalletDb};

/// What a bootstrap run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Names of the networks created, in config order.
    pub created: Vec<String>,
    /// Whether the primary network was selected by this run.
    pub selected_primary: bool,
}

/// Create missing builtin networks. Idempotent.
pub async fn bootstrap_networks(
    db: &WalletDb,
    networks: &[BuiltinNetwork],
    primary: &str,
) -> Result<BootstrapReport, DomainError> {
    let fresh = db.selected_network().is_none();
    let mut report = BootstrapReport::default();

    for network in networks {
        if db.network_by_name(&network.name).is_some() {
            continue;
        }
        db.create_network(network.to_spec()).await?;
        report.created.push(network.name.clone());
    }

    if fresh {
        if let Some((eid, row)) = db.network_by_name(primary) {
            if !row.selected {
                db.set_selected_network(eid)?;
            }
            report.selected_primary = true;
        }
    }

    info!(
        created = report.created.len(),
        primary = primary,
        "Builtin networks ready"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediatorConfig;
    use std::sync::Arc;
    use wm_01_entity_store::EntityStore;
    use wm_02_domain_model::HashKeyring;

    fn db() -> WalletDb {
        WalletDb::new(Arc::new(EntityStore::new()), Arc::new(HashKeyring::new()))
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let db = db();
        let config = MediatorConfig::default();

        let first = bootstrap_networks(&db, &config.networks, "CFX_MAINNET")
            .await
            .unwrap();
        assert_eq!(first.created, vec!["CFX_MAINNET", "CFX_TESTNET", "ETH_MAINNET"]);
        assert!(first.selected_primary);

        let second = bootstrap_networks(&db, &config.networks, "CFX_MAINNET")
            .await
            .unwrap();
        assert!(second.created.is_empty());
        assert!(!second.selected_primary);

        let (_, selected) = db.selected_network().unwrap();
        assert_eq!(selected.name, "CFX_MAINNET");
        assert!(selected.builtin);
    }

    #[tokio::test]
    async fn test_primary_other_than_first_is_selected() {
        let db = db();
        let config = MediatorConfig::default();
        bootstrap_networks(&db, &config.networks, "ETH_MAINNET")
            .await
            .unwrap();
        let (_, selected) = db.selected_network().unwrap();
        assert_eq!(selected.name, "ETH_MAINNET");
    }
}
