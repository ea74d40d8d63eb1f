//! # Validation Pipeline Flows
//!
//! Every request passes lookup, origin, lock, network, block-ref default,
//! family and schema checks in that order; the first failing step decides
//! the error and later steps never run.

use crate::harness::*;
use mediator_runtime::MediatorConfig;
use serde_json::json;
use shared_types::{codes, ErrorKind, RpcRequest};

// =============================================================================
// ORDERING
// =============================================================================

#[tokio::test]
async fn test_unknown_method_is_method_not_found() {
    let client = Client::start().await.unwrap();
    let err = client.popup("wallet_doesNotExist", json!([])).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);
    assert_eq!(err.code, codes::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn test_origin_checked_before_schema() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();

    // Bad params, but the page may not call this method at all.
    let err = client
        .inpage(ORIGIN, "wallet_unlock", json!({"nope": 1}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);
    assert!(err.message.contains("not allowed to call from inpage"));

    let err = client
        .popup("wallet_registerSiteMetadata", json!({"name": 5}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);
}

#[tokio::test]
async fn test_callers_without_flags_skip_scoping() {
    let client = Client::start().await.unwrap();
    let locked = client
        .send(RpcRequest::new("wallet_isLocked", json!(null)))
        .await
        .unwrap();
    assert_eq!(locked, json!(true));

    // Still subject to the later steps.
    let err = client
        .send(RpcRequest::new("wallet_getVaults", json!(null)))
        .await
        .unwrap_err();
    assert!(err.message.contains("wallet is locked"));
}

#[tokio::test]
async fn test_lock_checked_before_network() {
    let client = Client::start().await.unwrap();

    let err = client
        .popup_on("NO_SUCH_NET", "wallet_getVaults", json!(null))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);
    assert!(err.message.contains("wallet is locked"));

    // Methods allowed while locked reach network resolution.
    let err = client
        .popup_on("NO_SUCH_NET", "wallet_isLocked", json!(null))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParams);
    assert_eq!(err.message, "Invalid network name NO_SUCH_NET");
}

#[tokio::test]
async fn test_locked_wallet_parks_no_consent_request() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();
    client.connect(ORIGIN).await.unwrap();
    client.popup("wallet_lock", json!(null)).await.unwrap();

    let err = client
        .inpage(ORIGIN, "personal_sign", json!(["0x68656c6c6f", WATCH_ADDRESS]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);
    assert_eq!(err.message, "Method personal_sign not found, wallet is locked");
    assert!(client.mediator.consent().pending_requests().is_empty());
}

#[tokio::test]
async fn test_family_checked_before_schema() {
    let client = Client::start().await.unwrap();

    let err = client
        .popup_on("ETH_MAINNET", "cfx_epochNumber", json!(["not-a-ref", 1, 2]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);
    assert_eq!(
        err.message,
        "Method cfx_epochNumber not supported by network ETH_MAINNET"
    );

    let err = client
        .popup("cfx_epochNumber", json!(["not-a-ref", 1, 2]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidParams);
}

#[tokio::test]
async fn test_schema_error_explains_violation() {
    let client = Client::start().await.unwrap();
    let err = client
        .popup("wallet_unlock", json!({"password": 42}))
        .await
        .unwrap_err();
    assert_eq!(err.code, codes::INVALID_PARAMS);
    let data = err.data.expect("schema errors carry data");
    assert_eq!(data["params"], json!({"password": 42}));
    assert!(!data["explanation"].is_null());
}

// =============================================================================
// DEFAULTS AND ROUTING
// =============================================================================

#[tokio::test]
async fn test_block_ref_defaulted_per_family() {
    let client = Client::start().await.unwrap();

    let balance = client
        .popup("cfx_getBalance", json!(["cfx:aak2rra2njvd77ezwjvx04kkds9fzagfe6d5r8e957"]))
        .await
        .unwrap();
    assert_eq!(balance, json!("0x0"));

    let balance = client
        .popup_on("ETH_MAINNET", "eth_getBalance", json!([WATCH_ADDRESS, null]))
        .await
        .unwrap();
    assert_eq!(balance, json!("0x0"));
}

#[tokio::test]
async fn test_network_name_routes_request() {
    let client = Client::start().await.unwrap();
    let primary = client.popup("cfx_chainId", json!([])).await.unwrap();
    let testnet = client
        .popup_on("CFX_TESTNET", "cfx_chainId", json!([]))
        .await
        .unwrap();
    assert_eq!(primary, json!("0x405"));
    assert_eq!(testnet, json!("0x1"));

    let version = client
        .popup_on("ETH_MAINNET", "net_version", json!([]))
        .await
        .unwrap();
    assert_eq!(version, json!("1"));
}

#[tokio::test]
async fn test_trusted_origin_bypasses_caller_scoping() {
    let mut config = MediatorConfig::default();
    config.engine.trusted_origins = vec!["chrome-extension://wallet".into()];
    let client = Client::with_config(config).await.unwrap();
    client.import_mnemonic().await.unwrap();

    let vaults = client
        .inpage("chrome-extension://wallet", "wallet_getVaults", json!(null))
        .await
        .unwrap();
    assert_eq!(vaults.as_array().unwrap().len(), 1);

    let err = client
        .inpage(ORIGIN, "wallet_getVaults", json!(null))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);
}

#[tokio::test]
async fn test_lock_blocks_until_unlocked() {
    let client = Client::start().await.unwrap();
    client.import_mnemonic().await.unwrap();
    assert!(client.popup("wallet_getVaults", json!(null)).await.is_ok());

    client.popup("wallet_lock", json!(null)).await.unwrap();
    let err = client.popup("wallet_getVaults", json!(null)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::MethodNotFound);

    client
        .popup("wallet_unlock", json!({"password": PASSWORD}))
        .await
        .unwrap();
    assert!(client.popup("wallet_getVaults", json!(null)).await.is_ok());
}
