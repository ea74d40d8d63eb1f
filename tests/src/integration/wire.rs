//! # Wire Envelope
//!
//! Raw JSON in, response envelope out, as the stdin/stdout transport sees it.

use crate::harness::*;
use proptest::prelude::*;
use serde_json::{json, Value};
use shared_types::codes;

async fn roundtrip(client: &Client, raw: &str) -> Value {
    let response = client.mediator.handle_json(raw).await;
    serde_json::to_value(&response).unwrap()
}

#[tokio::test]
async fn test_success_envelope() {
    let client = Client::start().await.unwrap();
    let response = roundtrip(
        &client,
        r#"{"id": "a1", "method": "wallet_isLocked", "_popup": true}"#,
    )
    .await;
    assert_eq!(
        response,
        json!({"jsonrpc": "2.0", "id": "a1", "result": true})
    );
}

#[tokio::test]
async fn test_error_envelope_keeps_id() {
    let client = Client::start().await.unwrap();
    let response = roundtrip(
        &client,
        r#"{"id": 3, "method": "wallet_getVaults", "_inpage": true, "_origin": "https://dapp.example"}"#,
    )
    .await;
    assert_eq!(response["id"], json!(3));
    assert_eq!(response["error"]["code"], json!(codes::METHOD_NOT_FOUND));
    assert!(response.get("result").is_none());
}

#[tokio::test]
async fn test_network_name_on_the_wire() {
    let client = Client::start().await.unwrap();
    let response = roundtrip(
        &client,
        r#"{"id": 1, "method": "cfx_chainId", "networkName": "CFX_TESTNET", "_popup": true}"#,
    )
    .await;
    assert_eq!(response["result"], json!("0x1"));
}

#[tokio::test]
async fn test_malformed_input_gets_parse_error_without_id() {
    let client = Client::start().await.unwrap();
    for raw in ["", "[]", "{\"id\": 1}", "{\"method\": 7}"] {
        let response = roundtrip(&client, raw).await;
        assert_eq!(response["error"]["code"], json!(codes::PARSE_ERROR), "{raw}");
        assert!(response.get("id").is_none());
    }
}

#[tokio::test]
async fn test_inpage_origin_required() {
    let client = Client::start().await.unwrap();
    let response = roundtrip(
        &client,
        r#"{"id": 1, "method": "cfx_accounts", "_inpage": true}"#,
    )
    .await;
    assert_eq!(response["error"]["code"], json!(codes::METHOD_NOT_FOUND));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn unregistered_methods_are_not_found(suffix in "[a-zA-Z]{1,16}", popup in any::<bool>()) {
        let raw = json!({"id": 1, "method": format!("zz_{suffix}"), "_popup": popup}).to_string();
        let response = tokio_test::block_on(async {
            let client = Client::start().await.unwrap();
            roundtrip(&client, &raw).await
        });
        prop_assert_eq!(&response["error"]["code"], &json!(codes::METHOD_NOT_FOUND));
    }

    #[test]
    fn ids_echo_back(id in any::<u32>()) {
        let raw = json!({"id": id, "method": "wallet_isLocked", "_popup": true}).to_string();
        let response = tokio_test::block_on(async {
            let client = Client::start().await.unwrap();
            roundtrip(&client, &raw).await
        });
        prop_assert_eq!(&response["id"], &json!(id));
        prop_assert_eq!(&response["result"], &json!(true));
    }
}
