//! # Wallet Management Flows
//!
//! Vault imports, account naming, network lifecycle and the site pushes
//! that follow store changes.

use crate::harness::*;
use serde_json::{json, Value};
use shared_bus::{EventFilter, Subscription, WalletEvent};
use shared_types::{ErrorKind, RpcRequest};
use std::time::Duration;
use tokio::time::timeout;

/// Params of the next `event` push, skipping other pushes.
async fn next_push(sub: &mut Subscription, event: &str) -> Value {
    loop {
        let received = timeout(Duration::from_secs(1), sub.recv())
            .await
            .unwrap_or_else(|_| panic!("no {event} push"))
            .expect("bus open");
        if let WalletEvent::SiteEvent {
            event: name,
            params,
            ..
        } = received
        {
            if name == event {
                return params;
            }
        }
    }
}

fn devnet() -> Value {
    json!({
        "name": "CFX_DEVNET",
        "type": "cfx",
        "chainId": "0xbb7",
        "netId": 2999,
        "endpoint": "http://localhost:12537",
    })
}

// =============================================================================
// VAULTS
// =============================================================================

#[tokio::test]
async fn test_duplicate_credentials_rejected_across_kinds() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let err = client.import_mnemonic().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateCredential);

    client
        .popup(
            "wallet_importPrivateKey",
            json!({"password": PASSWORD, "privateKey": PRIVATE_KEY}),
        )
        .await
        .unwrap();
    let err = client
        .popup(
            "wallet_importPrivateKey",
            json!({"password": PASSWORD, "privateKey": PRIVATE_KEY}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateCredential);

    let vaults = client.popup("wallet_getVaults", json!(null)).await.unwrap();
    assert_eq!(vaults.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_second_import_needs_wallet_password() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let err = client
        .popup(
            "wallet_importPrivateKey",
            json!({"password": "another one", "privateKey": PRIVATE_KEY}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.message, "Invalid password");
}

#[tokio::test]
async fn test_export_by_vault_kind() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let pk = client
        .popup(
            "wallet_importPrivateKey",
            json!({"password": PASSWORD, "privateKey": PRIVATE_KEY}),
        )
        .await
        .unwrap();
    let exported = client
        .popup(
            "wallet_exportAccount",
            json!({"accountId": pk["account"], "password": PASSWORD}),
        )
        .await
        .unwrap();
    assert_eq!(exported, json!(PRIVATE_KEY));

    let watch = client
        .popup(
            "wallet_importAddress",
            json!({"password": PASSWORD, "address": WATCH_ADDRESS}),
        )
        .await
        .unwrap();
    let err = client
        .popup_on(
            "ETH_MAINNET",
            "wallet_exportAccount",
            json!({"accountId": watch["account"], "password": PASSWORD}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAllowed);
}

#[tokio::test]
async fn test_account_nicknames_unique_within_group() {
    let client = Client::start().await.unwrap();
    let imported = client.import_mnemonic().await.unwrap();

    let second = client
        .popup(
            "wallet_createAccount",
            json!({"accountGroupId": imported.group.get(), "nickname": "Trading"}),
        )
        .await
        .unwrap();
    let err = client
        .popup(
            "wallet_updateAccount",
            json!({"accountId": imported.account.get(), "nickname": "Trading"}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidNickname);

    // Renaming to its own name is not a collision.
    client
        .popup(
            "wallet_updateAccount",
            json!({"accountId": second["eid"], "nickname": "Trading"}),
        )
        .await
        .unwrap();
}

// =============================================================================
// NETWORKS
// =============================================================================

#[tokio::test]
async fn test_builtin_networks_protected() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();
    let (mainnet, _) = client.mediator.db().network_by_name("CFX_MAINNET").unwrap();

    let err = client
        .popup(
            "wallet_deleteNetwork",
            json!({"networkId": mainnet.get(), "password": PASSWORD}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::BuiltinProtected);
    assert!(client.mediator.db().network_by_name("CFX_MAINNET").is_some());
}

#[tokio::test]
async fn test_delete_network_moves_apps_and_keeps_accounts() {
    let client = Client::start().await.unwrap();
    let imported = client.import_mnemonic().await.unwrap();
    client.connect(ORIGIN).await.unwrap();
    let mut pushes = client.mediator.subscribe(EventFilter::for_origin(ORIGIN));

    let devnet = client.popup("wallet_addNetwork", devnet()).await.unwrap();
    assert_eq!(client.mediator.db().account_addresses(imported.account).len(), 4);

    client
        .popup("wallet_setCurrentNetwork", json!([devnet]))
        .await
        .unwrap();
    assert_eq!(next_push(&mut pushes, "chainChanged").await, json!("0xbb7"));

    client
        .popup(
            "wallet_deleteNetwork",
            json!({"networkId": devnet, "password": PASSWORD}),
        )
        .await
        .unwrap();
    assert_eq!(next_push(&mut pushes, "chainChanged").await, json!("0x405"));

    let db = client.mediator.db();
    assert_eq!(db.account_addresses(imported.account).len(), 3);
    let (_, app) = db.app_for_origin(ORIGIN).unwrap();
    assert_eq!(app.accounts, vec![imported.account]);
    let (_, selected) = db.selected_network().unwrap();
    assert_eq!(selected.name, "CFX_MAINNET");
}

// =============================================================================
// SITE PUSHES
// =============================================================================

#[tokio::test]
async fn test_pushes_reach_only_their_origin() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();
    let mut mine = client.mediator.subscribe(EventFilter::for_origin(ORIGIN));
    let mut theirs = client
        .mediator
        .subscribe(EventFilter::for_origin(OTHER_ORIGIN));

    client
        .inpage(
            ORIGIN,
            "wallet_registerSiteMetadata",
            json!({"name": "Dapp", "icon": "https://dapp.example/icon.png"}),
        )
        .await
        .unwrap();
    assert_eq!(
        next_push(&mut mine, "connect").await,
        json!({"chainId": "0x405", "networkId": "1029"})
    );

    client.connect(ORIGIN).await.unwrap();
    let accounts = next_push(&mut mine, "accountsChanged").await;
    assert_eq!(accounts.as_array().unwrap().len(), 1);

    let app_id = client.mediator.db().app_for_origin(ORIGIN).unwrap().0;
    client
        .popup("wallet_deleteApp", json!({"appId": app_id.get()}))
        .await
        .unwrap();
    assert_eq!(next_push(&mut mine, "accountsChanged").await, json!([]));

    assert!(matches!(theirs.try_recv(), Ok(None)));
    let (_, site) = client.mediator.db().site_by_origin(ORIGIN).unwrap();
    assert_eq!(site.name.as_deref(), Some("Dapp"));
}

#[tokio::test]
async fn test_switch_chain_moves_only_the_app() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();
    client.connect(ORIGIN).await.unwrap();
    let mut pushes = client.mediator.subscribe(EventFilter::for_origin(ORIGIN));

    let parked = client
        .park(
            RpcRequest::new(
                "wallet_switchEthereumChain",
                json!([{"chainId": "0x1"}]),
            )
            .from_inpage(ORIGIN)
            .on_network("ETH_MAINNET"),
        )
        .await
        .unwrap();
    client.approve(parked.auth_req, Value::Null).await.unwrap();
    assert_eq!(parked.outcome().await.unwrap(), Value::Null);
    assert_eq!(next_push(&mut pushes, "chainChanged").await, json!("0x1"));

    let accounts = client
        .send(
            RpcRequest::new("eth_accounts", json!([]))
                .from_inpage(ORIGIN)
                .on_network("ETH_MAINNET"),
        )
        .await
        .unwrap();
    assert!(accounts[0].as_str().unwrap().starts_with("0x"));
    let (_, selected) = client.mediator.db().selected_network().unwrap();
    assert_eq!(selected.name, "CFX_MAINNET");
}
