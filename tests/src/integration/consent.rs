//! # Consent Flows
//!
//! A page call to a consent-gated method parks until the popup approves or
//! rejects its AuthReq. Resolutions re-enter the dispatcher as internal
//! calls carrying the page's origin.

use crate::harness::*;
use serde_json::{json, Value};
use shared_bus::{EventFilter, EventTopic, WalletEvent};
use shared_types::{codes, ErrorKind, RpcRequest};
use std::time::Duration;
use tokio::time::timeout;

async fn next_event(sub: &mut shared_bus::Subscription) -> WalletEvent {
    timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("event within a second")
        .expect("bus open")
}

// =============================================================================
// APPROVE / REJECT
// =============================================================================

#[tokio::test]
async fn test_approval_grants_and_answers_both_sides() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let parked = client
        .park_inpage(ORIGIN, "wallet_requestPermissions", json!([{"wallet_accounts": {}}]))
        .await
        .unwrap();

    let pending = client
        .popup("wallet_getPendingAuthRequest", json!(null))
        .await
        .unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["authReqId"], json!(parked.auth_req));
    assert_eq!(pending[0]["site"]["origin"], json!(ORIGIN));
    assert_eq!(pending[0]["req"]["method"], json!("wallet_requestPermissions"));

    let popup = client.approve(parked.auth_req, Value::Null).await.unwrap();
    assert_eq!(popup, json!("0x1"));

    let page = parked.outcome().await.unwrap();
    assert_eq!(
        page,
        json!([
            {"parentCapability": "wallet_basic"},
            {"parentCapability": "wallet_accounts"},
        ])
    );

    let accounts = client.inpage(ORIGIN, "cfx_accounts", json!([])).await.unwrap();
    assert_eq!(accounts.as_array().unwrap().len(), 1);
    assert!(accounts[0].as_str().unwrap().starts_with("cfx:"));

    let pending = client
        .popup("wallet_getPendingAuthRequest", json!(null))
        .await
        .unwrap();
    assert_eq!(pending, json!([]));
}

#[tokio::test]
async fn test_rejection_reaches_page_as_user_rejected() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let parked = client
        .park_inpage(ORIGIN, "wallet_requestPermissions", json!([{"wallet_accounts": {}}]))
        .await
        .unwrap();
    let auth_req = parked.auth_req;
    assert_eq!(client.reject(auth_req).await.unwrap(), json!("0x1"));

    let err = parked.outcome().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserRejected);
    assert_eq!(err.code, codes::USER_REJECTED);
    assert!(client.mediator.db().app_for_origin(ORIGIN).is_none());

    // A settled AuthReq can not be resolved again.
    let err = client.reject(auth_req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParams);
}

#[tokio::test]
async fn test_parked_requests_resolve_independently() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let first = client
        .park_inpage(ORIGIN, "wallet_requestPermissions", json!([{"wallet_accounts": {}}]))
        .await
        .unwrap();
    let second = client
        .park_inpage(
            OTHER_ORIGIN,
            "wallet_requestPermissions",
            json!([{"wallet_accounts": {}}]),
        )
        .await
        .unwrap();
    assert_ne!(first.auth_req, second.auth_req);

    client.reject(second.auth_req).await.unwrap();
    let err = second.outcome().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserRejected);
    assert!(!first.call.is_finished());

    client.approve(first.auth_req, Value::Null).await.unwrap();
    assert!(first.outcome().await.is_ok());

    assert!(client.mediator.db().app_for_origin(ORIGIN).is_some());
    assert!(client.mediator.db().app_for_origin(OTHER_ORIGIN).is_none());
}

#[tokio::test]
async fn test_approval_without_account_is_a_denial() {
    let client = Client::start().await.unwrap();

    // Locked and without accounts: the approval grants nothing.
    let parked = client
        .park_inpage(ORIGIN, "wallet_requestPermissions", json!([{"cfx_accounts": {}}]))
        .await
        .unwrap();
    let popup = client.approve(parked.auth_req, Value::Null).await.unwrap();
    assert_eq!(popup, json!("0x1"));

    let page_err = parked.outcome().await.unwrap_err();
    assert_eq!(page_err.code, codes::USER_REJECTED);
    assert!(client.mediator.db().app_for_origin(ORIGIN).is_none());
}

#[tokio::test]
async fn test_failed_resolution_reaches_both_sides() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let parked = client
        .park_inpage(ORIGIN, "wallet_requestPermissions", json!([{"wallet_accounts": {}}]))
        .await
        .unwrap();
    let popup_err = client
        .approve(parked.auth_req, json!({"accounts": [424242]}))
        .await
        .unwrap_err();
    assert_eq!(popup_err.kind, ErrorKind::InvalidParams);
    assert_eq!(popup_err.message, "Invalid id 424242, entity not found");

    let page_err = parked.outcome().await.unwrap_err();
    assert_eq!(page_err.message, popup_err.message);
    assert!(client.mediator.consent().pending_requests().is_empty());
}

#[tokio::test]
async fn test_direct_resolution_runs_on_page_network() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let parked = client
        .park(
            RpcRequest::new("eth_requestAccounts", json!([]))
                .from_inpage(ORIGIN)
                .on_network("ETH_MAINNET"),
        )
        .await
        .unwrap();
    let popup = client
        .popup(
            "wallet_requestPermissions",
            json!({"authReqId": parked.auth_req}),
        )
        .await
        .unwrap();
    assert_eq!(popup, json!("0x1"));

    let accounts = parked.outcome().await.unwrap();
    let address = accounts[0].as_str().unwrap();
    assert!(address.starts_with("0x"), "{address}");
    let db = client.mediator.db();
    let (_, app) = db.app_for_origin(ORIGIN).unwrap();
    let (eth, _) = db.network_by_name("ETH_MAINNET").unwrap();
    assert_eq!(app.current_network, eth);
}

#[tokio::test]
async fn test_second_approval_of_same_request_fails() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let parked = client
        .park_inpage(ORIGIN, "wallet_requestPermissions", json!([{"wallet_accounts": {}}]))
        .await
        .unwrap();
    let auth_req = parked.auth_req;
    let (first, second) = tokio::join!(
        client.approve(auth_req, Value::Null),
        client.approve(auth_req, Value::Null),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let err = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(err.kind, ErrorKind::InvalidParams);
    assert!(parked.outcome().await.is_ok());
}

#[tokio::test]
async fn test_consent_events_published() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();
    let mut events = client
        .mediator
        .subscribe(EventFilter::topics(vec![EventTopic::Consent]));

    let parked = client
        .park_inpage(ORIGIN, "wallet_requestPermissions", json!([{"wallet_basic": {}}]))
        .await
        .unwrap();
    match next_event(&mut events).await {
        WalletEvent::AuthRequested { auth_req, origin, method } => {
            assert_eq!(auth_req.get(), parked.auth_req);
            assert_eq!(origin, ORIGIN);
            assert_eq!(method, "wallet_requestPermissions");
        }
        other => panic!("unexpected event {other:?}"),
    }

    client.reject(parked.auth_req).await.unwrap();
    match next_event(&mut events).await {
        WalletEvent::AuthResolved { auth_req, approved } => {
            assert_eq!(auth_req.get(), parked.auth_req);
            assert!(!approved);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

// =============================================================================
// GRANTS
// =============================================================================

#[tokio::test]
async fn test_grants_only_ever_add() {
    let client = Client::start().await.unwrap();
    let imported = client.import_mnemonic().await.unwrap();

    let parked = client
        .park_inpage(ORIGIN, "wallet_requestPermissions", json!([{"wallet_basic": {}}]))
        .await
        .unwrap();
    client.approve(parked.auth_req, Value::Null).await.unwrap();
    assert_eq!(
        parked.outcome().await.unwrap(),
        json!([{"parentCapability": "wallet_basic"}])
    );
    assert_eq!(
        client.inpage(ORIGIN, "cfx_accounts", json!([])).await.unwrap(),
        json!([])
    );

    client.connect(ORIGIN).await.unwrap();
    let second = client
        .popup(
            "wallet_createAccount",
            json!({"accountGroupId": imported.group.get()}),
        )
        .await
        .unwrap();

    let parked = client
        .park_inpage(ORIGIN, "wallet_requestPermissions", json!([{"cfx_accounts": {}}]))
        .await
        .unwrap();
    client
        .approve(parked.auth_req, json!({"accounts": [second["eid"]]}))
        .await
        .unwrap();
    let perms = parked.outcome().await.unwrap();
    assert_eq!(
        perms,
        json!([
            {"parentCapability": "wallet_basic"},
            {"parentCapability": "wallet_accounts"},
        ])
    );

    let accounts = client.inpage(ORIGIN, "cfx_accounts", json!([])).await.unwrap();
    assert_eq!(accounts.as_array().unwrap().len(), 2);
    // The first granted account stays current.
    let (_, app) = client.mediator.db().app_for_origin(ORIGIN).unwrap();
    assert_eq!(app.current_account, Some(imported.account));
}

#[tokio::test]
async fn test_page_needs_app_for_app_scoped_methods() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let err = client
        .inpage(ORIGIN, "personal_sign", json!(["hello", WATCH_ADDRESS]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
    assert_eq!(
        err.message,
        format!("Site {ORIGIN} is not authorized, request permissions first")
    );
    assert!(client.mediator.consent().pending_requests().is_empty());
}

// =============================================================================
// NESTED CALLS
// =============================================================================

#[tokio::test]
async fn test_request_accounts_nests_permission_request() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    let parked = client
        .park_inpage(ORIGIN, "cfx_requestAccounts", json!([]))
        .await
        .unwrap();
    let pending = client.mediator.consent().pending_requests();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].req.method, "wallet_requestPermissions");
    assert_eq!(pending[0].site.origin, ORIGIN);

    client.approve(parked.auth_req, Value::Null).await.unwrap();
    let accounts = parked.outcome().await.unwrap();
    assert_eq!(accounts.as_array().unwrap().len(), 1);

    // Already authorized: answered without parking.
    let again = client
        .inpage(ORIGIN, "cfx_requestAccounts", json!([]))
        .await
        .unwrap();
    assert_eq!(again, accounts);
}

#[tokio::test]
async fn test_sign_resolves_on_page_network() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();
    client.connect(ORIGIN).await.unwrap();
    let address = client.inpage(ORIGIN, "cfx_accounts", json!([])).await.unwrap()[0].clone();

    let parked = client
        .park_inpage(ORIGIN, "personal_sign", json!(["0x68656c6c6f", address]))
        .await
        .unwrap();
    assert_eq!(
        client.approve(parked.auth_req, Value::Null).await.unwrap(),
        json!("0x1")
    );
    let signature = parked.outcome().await.unwrap();
    assert!(signature.as_str().unwrap().starts_with("0x"));
}
