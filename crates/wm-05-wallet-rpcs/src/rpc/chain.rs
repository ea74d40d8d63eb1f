//! Dapp-facing chain methods.
//!
//! Account exposure, cached chain identity, node pass-throughs, message
//! signing, chain switching and HD account discovery.

use super::{default_ticker, original_arg, resolving, to_result, ETH_HD_PATH};
use crate::views::AccountView;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{ChainFamily, Eid, Permission, RpcError, Ticker};
use std::time::Duration;
use tracing::{info, warn};
use wm_01_entity_store::{Account, AuthReq, Network};
use wm_02_domain_model::{NetworkSpec, WalletDb};
use wm_04_rpc_engine::{
    Access, CachePolicy, EngineError, Field, MethodRegistry, MethodSpec, ParamSchema, RpcContext,
    RpcResult,
};

/// Chain identity barely ever changes under a network name.
const CHAIN_ID_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Balance lookups per discovery call when no limit is given.
const DEFAULT_DISCOVERY_LIMIT: u64 = 10;

fn chain_config_schema() -> ParamSchema {
    ParamSchema::object([
        Field::required("chainId", ParamSchema::Hex),
        Field::optional("chainName", ParamSchema::Str),
        Field::optional(
            "nativeCurrency",
            ParamSchema::object([
                Field::required("name", ParamSchema::Str),
                Field::required("symbol", ParamSchema::Str),
                Field::required("decimals", ParamSchema::Uint),
            ]),
        ),
        Field::optional("rpcUrls", ParamSchema::array_of(ParamSchema::Str)),
    ])
}

fn resolution_schema(parked: ParamSchema) -> ParamSchema {
    ParamSchema::or([
        parked,
        ParamSchema::object([Field::required("authReqId", ParamSchema::Uint)]),
    ])
}

fn address_and_ref() -> ParamSchema {
    ParamSchema::tuple([ParamSchema::Address, ParamSchema::BlockRef.optional()])
}

pub(super) fn register(registry: &mut MethodRegistry) -> Result<(), EngineError> {
    // accounts
    for name in ["cfx_requestAccounts", "eth_requestAccounts"] {
        registry.register(
            MethodSpec::new(name)
                .inpage()
                .allow_locked()
                .calls(&["wallet_requestPermissions"])
                .db(&[Access::Read]),
            request_accounts,
        )?;
    }
    for name in ["cfx_accounts", "eth_accounts"] {
        registry.register(
            MethodSpec::new(name).inpage().allow_locked().db(&[Access::Read]),
            accounts,
        )?;
    }

    // chain identity
    registry.register(
        MethodSpec::new("cfx_chainId")
            .inpage()
            .popup()
            .allow_locked()
            .cache(CachePolicy::ttl(CHAIN_ID_TTL)),
        cfx_chain_id,
    )?;
    for name in ["eth_chainId", "net_version"] {
        registry.register(
            MethodSpec::new(name)
                .inpage()
                .popup()
                .allow_locked()
                .cache(CachePolicy::ttl(CHAIN_ID_TTL)),
            forward,
        )?;
    }

    // pass-throughs
    registry.register(
        MethodSpec::new("cfx_getStatus").inpage().popup().allow_locked(),
        forward,
    )?;
    registry.register(
        MethodSpec::new("cfx_epochNumber")
            .inpage()
            .popup()
            .allow_locked()
            .schema(ParamSchema::tuple([ParamSchema::BlockRef.optional()])),
        forward,
    )?;
    registry.register(
        MethodSpec::new("eth_blockNumber")
            .inpage()
            .popup()
            .allow_locked()
            .schema(ParamSchema::tuple([])),
        forward,
    )?;
    for name in ["cfx_getBalance", "eth_getBalance"] {
        registry.register(
            MethodSpec::new(name)
                .inpage()
                .popup()
                .allow_locked()
                .schema(address_and_ref()),
            forward,
        )?;
    }

    // consent-gated
    registry.register(
        MethodSpec::new("personal_sign")
            .inpage()
            .popup()
            .consent()
            .requires_app()
            .db(&[Access::Read, Access::Keys])
            .schema(resolution_schema(ParamSchema::tuple([
                ParamSchema::Str,
                ParamSchema::Address,
            ]))),
        personal_sign,
    )?;
    registry.register(
        MethodSpec::new("wallet_switchEthereumChain")
            .inpage()
            .popup()
            .consent()
            .requires_app()
            .db(&[Access::Write])
            .schema(resolution_schema(ParamSchema::tuple([ParamSchema::object([
                Field::required("chainId", ParamSchema::Hex),
            ])]))),
        switch_ethereum_chain,
    )?;
    registry.register(
        MethodSpec::new("wallet_addEthereumChain")
            .inpage()
            .popup()
            .consent()
            .requires_app()
            .db(&[Access::Write])
            .schema(resolution_schema(ParamSchema::tuple([chain_config_schema()]))),
        add_ethereum_chain,
    )?;

    registry.register(
        MethodSpec::new("wallet_discoverAccounts")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::object([
                Field::required("accountGroupId", ParamSchema::Uint),
                Field::optional("limit", ParamSchema::Uint),
            ])),
        discover_accounts,
    )?;
    Ok(())
}

// =============================================================================
// ACCOUNTS
// =============================================================================

fn has_accounts(db: &WalletDb, origin: &str) -> bool {
    db.app_for_origin(origin).is_some_and(|(_, app)| {
        app.perms.contains(&Permission::WalletAccounts) && !app.accounts.is_empty()
    })
}

/// Authorized addresses, asking for the accounts permission first when the
/// site has none.
async fn request_accounts(ctx: RpcContext) -> RpcResult {
    let origin = ctx.require_origin()?.to_string();
    if !has_accounts(ctx.reader()?, &origin) {
        ctx.call("wallet_requestPermissions", json!([{"wallet_accounts": {}}]))
            .await?;
    }
    Ok(ctx.reader()?.site_accounts_value(&origin))
}

/// Authorized addresses; empty while locked.
async fn accounts(ctx: RpcContext) -> RpcResult {
    let db = ctx.reader()?;
    if db.is_locked() {
        return Ok(json!([]));
    }
    Ok(db.site_accounts_value(ctx.require_origin()?))
}

// =============================================================================
// NODE
// =============================================================================

async fn forward(ctx: RpcContext) -> RpcResult {
    ctx.chain(ctx.method(), ctx.params().clone()).await
}

async fn cfx_chain_id(ctx: RpcContext) -> RpcResult {
    let status = ctx.chain("cfx_getStatus", json!([])).await?;
    status
        .get("chainId")
        .cloned()
        .ok_or_else(|| RpcError::internal("cfx_getStatus returned no chainId"))
}

// =============================================================================
// SIGNING AND CHAIN SWITCHING
// =============================================================================

/// Address eid of one of the App's accounts on the resolved network.
fn authorized_address(
    ctx: &RpcContext,
    db: &WalletDb,
    auth_req: &AuthReq,
    wanted: &str,
) -> Result<Eid, RpcError> {
    let (_, app) = db
        .app_for_site(auth_req.site)
        .ok_or_else(|| RpcError::unauthorized("Site has no authorized app"))?;
    app.accounts
        .iter()
        .filter_map(|account| db.account_address_on_network(*account, ctx.network_eid()))
        .find(|(_, address)| {
            address.value().eq_ignore_ascii_case(wanted) || address.hex.eq_ignore_ascii_case(wanted)
        })
        .map(|(eid, _)| eid)
        .ok_or_else(|| RpcError::unauthorized(format!("Address {wanted} is not authorized")))
}

async fn personal_sign(ctx: RpcContext) -> RpcResult {
    let (auth_req_id, auth_req) = resolving(&ctx)?;
    let message = ctx
        .params()
        .get("data")
        .cloned()
        .unwrap_or_else(|| original_arg(&auth_req, 0));
    let wanted = original_arg(&auth_req, 1);
    let (Some(message), Some(wanted)) = (message.as_str(), wanted.as_str()) else {
        return Err(RpcError::invalid_params("Invalid params: expected [message, address]"));
    };

    let address = authorized_address(&ctx, ctx.reader()?, &auth_req, wanted)?;
    let signature = ctx.keys()?.sign_message(address, message).await?;
    info!(auth_req = %auth_req_id, "Message signed");
    Ok(json!(signature))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainConfig {
    chain_id: String,
    chain_name: Option<String>,
    native_currency: Option<Ticker>,
    #[serde(default)]
    rpc_urls: Vec<String>,
}

/// Chain config of a resolution: the popup's override under `key`, else the
/// one the page asked with.
fn chain_config(ctx: &RpcContext, auth_req: &AuthReq, key: &str) -> Result<ChainConfig, RpcError> {
    let raw = ctx
        .params()
        .get(key)
        .cloned()
        .unwrap_or_else(|| original_arg(auth_req, 0));
    serde_json::from_value(raw).map_err(|e| RpcError::invalid_params(format!("Invalid params: {e}")))
}

fn eth_network_by_chain_id(db: &WalletDb, chain_id: &str) -> Option<(Eid, Network)> {
    db.all::<Network>()
        .into_iter()
        .find(|(_, n)| n.family == ChainFamily::Eth && n.chain_id.eq_ignore_ascii_case(chain_id))
}

fn switch_app_network(db: &WalletDb, auth_req: &AuthReq, network: Eid) -> Result<(), RpcError> {
    let (app, _) = db
        .app_for_site(auth_req.site)
        .ok_or_else(|| RpcError::unauthorized("Site has no authorized app"))?;
    db.set_app_current_network(app, network)?;
    Ok(())
}

async fn switch_ethereum_chain(ctx: RpcContext) -> RpcResult {
    let (_, auth_req) = resolving(&ctx)?;
    let config = chain_config(&ctx, &auth_req, "chainConfig")?;
    let db = ctx.writer()?;
    let (network, _) = eth_network_by_chain_id(db, &config.chain_id).ok_or_else(|| {
        RpcError::invalid_params(format!("Unrecognized chain ID {}", config.chain_id))
    })?;
    switch_app_network(db, &auth_req, network)?;
    Ok(Value::Null)
}

/// Add the chain unless a network with its chain id exists, then switch the
/// App to it.
async fn add_ethereum_chain(ctx: RpcContext) -> RpcResult {
    let (_, auth_req) = resolving(&ctx)?;
    let config = chain_config(&ctx, &auth_req, "newChainConfig")?;
    let db = ctx.writer()?;

    let network = match eth_network_by_chain_id(db, &config.chain_id) {
        Some((network, _)) => network,
        None => {
            let net_id = u64::from_str_radix(config.chain_id.trim_start_matches("0x"), 16)
                .map_err(|_| {
                    RpcError::invalid_params(format!("Invalid chain ID {}", config.chain_id))
                })?;
            let endpoint = config
                .rpc_urls
                .first()
                .cloned()
                .ok_or_else(|| RpcError::invalid_params("Invalid params: rpcUrls is empty"))?;
            let spec = NetworkSpec {
                name: config
                    .chain_name
                    .clone()
                    .unwrap_or_else(|| format!("Chain {}", config.chain_id)),
                family: ChainFamily::Eth,
                chain_id: config.chain_id.to_lowercase(),
                net_id,
                endpoint,
                ticker: config
                    .native_currency
                    .clone()
                    .unwrap_or_else(|| default_ticker(ChainFamily::Eth)),
                hd_path: ETH_HD_PATH.to_string(),
                builtin: false,
            };
            let network = db.create_network(spec).await?;
            info!(network = %network, chain_id = %config.chain_id, "Chain added by site");
            network
        }
    };
    switch_app_network(db, &auth_req, network)?;
    Ok(Value::Null)
}

// =============================================================================
// DISCOVERY
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoverParams {
    account_group_id: Eid,
    limit: Option<u64>,
}

fn balance_method(family: ChainFamily) -> &'static str {
    match family {
        ChainFamily::Cfx => "cfx_getBalance",
        ChainFamily::Eth => "eth_getBalance",
    }
}

fn is_zero_balance(balance: &Value) -> bool {
    balance
        .as_str()
        .map(|b| b.trim_start_matches("0x").trim_start_matches('0').is_empty())
        .unwrap_or(true)
}

/// Create accounts in an HD group while the next derived address holds
/// funds on the resolved network. Returns the created accounts.
///
/// A lookup the node cannot answer ends discovery like an empty balance.
async fn discover_accounts(ctx: RpcContext) -> RpcResult {
    let p: DiscoverParams = ctx.params_as()?;
    let db = ctx.writer()?;
    let network = ctx.network().clone();
    let method = balance_method(network.family);

    let mut created = Vec::new();
    for _ in 0..p.limit.unwrap_or(DEFAULT_DISCOVERY_LIMIT) {
        let address = db
            .next_account_address(p.account_group_id, ctx.network_eid())
            .await?;
        let params = json!([address, network.family.default_block_ref()]);
        let balance = match ctx.chain_on(&network, method, params).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(address = %address, error = %e.message, "Balance lookup failed, stopping discovery");
                break;
            }
        };
        if is_zero_balance(&balance) {
            break;
        }
        let account = db.create_account(p.account_group_id, None).await?;
        let row = db.require::<Account>(account)?;
        created.push(AccountView::on_network(db, account, row, ctx.network_eid()));
    }
    info!(group = %p.account_group_id, found = created.len(), "Account discovery finished");
    to_result(created)
}

#[cfg(test)]
mod tests {
    use super::is_zero_balance;
    use crate::testing::*;
    use serde_json::json;
    use shared_types::{codes, RpcError};
    use tokio_test::{assert_pending, assert_ready_ok, task};

    #[test]
    fn test_zero_balance_forms() {
        assert!(is_zero_balance(&json!("0x0")));
        assert!(is_zero_balance(&json!("0x")));
        assert!(is_zero_balance(&json!(null)));
        assert!(!is_zero_balance(&json!("0x10")));
    }

    #[tokio::test]
    async fn test_request_accounts_parks_until_granted() {
        let w = wallet().await;
        let imported = w.import().await;

        let mut parked = task::spawn(w.inpage("cfx_requestAccounts", json!(null)));
        assert_pending!(parked.poll());
        let pending = w.consent().pending_requests();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].req.method, "wallet_requestPermissions");

        w.popup(
            "wallet_userApprovedAuthRequest",
            json!({"authReqId": w.pending_id(), "res": {"accounts": [imported.account.get()]}}),
        )
        .await
        .unwrap();
        let accounts = assert_ready_ok!(parked.poll());
        assert_eq!(accounts.as_array().unwrap().len(), 1);
        assert!(accounts[0].as_str().unwrap().starts_with("cfx:"));

        let again = w.inpage("cfx_requestAccounts", json!(null)).await.unwrap();
        assert_eq!(again, accounts);
        assert!(w.consent().pending_requests().is_empty());
    }

    #[tokio::test]
    async fn test_accounts_empty_while_locked() {
        let w = wallet().await;
        w.import().await;
        w.connect().await;
        assert_eq!(w.inpage("cfx_accounts", json!(null)).await.unwrap().as_array().unwrap().len(), 1);

        w.popup("wallet_lock", json!(null)).await.unwrap();
        assert_eq!(w.inpage("cfx_accounts", json!(null)).await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_chain_id_cached_per_network() {
        let w = wallet().await;
        assert_eq!(w.inpage("cfx_chainId", json!(null)).await.unwrap(), json!("0x405"));
        assert_eq!(w.inpage("cfx_chainId", json!(null)).await.unwrap(), json!("0x405"));
        assert_eq!(w.chain.calls("cfx_getStatus"), 1);

        let testnet = w.popup_on("CFX_TESTNET", "cfx_chainId", json!(null)).await.unwrap();
        assert_eq!(testnet, json!("0x1"));
        assert_eq!(w.chain.calls("cfx_getStatus"), 2);

        let version = w.popup_on("ETH_MAINNET", "net_version", json!(null)).await.unwrap();
        assert_eq!(version, json!("1"));
    }

    #[tokio::test]
    async fn test_balance_defaults_block_ref() {
        let w = wallet().await;
        let imported = w.import().await;
        let address = w
            .db()
            .account_addresses(imported.account)
            .into_iter()
            .map(|(_, a)| a.value().to_string())
            .find(|v| v.starts_with("cfx:"))
            .unwrap();
        w.chain.respond("cfx_getBalance", json!("0x64"));

        let balance = w
            .inpage("cfx_getBalance", json!([address]))
            .await
            .unwrap();
        assert_eq!(balance, json!("0x64"));

        let err = w
            .inpage("cfx_getBalance", json!(["not-an-address"]))
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);
        assert_eq!(w.chain.calls("cfx_getBalance"), 1);
    }

    #[tokio::test]
    async fn test_personal_sign_needs_authorized_address() {
        let w = wallet().await;
        w.import().await;

        let err = w
            .inpage("personal_sign", json!(["hello", ETH_ADDRESS]))
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::UNAUTHORIZED);

        w.connect().await;
        let address = w.inpage("cfx_accounts", json!(null)).await.unwrap()[0].clone();
        let mut parked = task::spawn(w.inpage("personal_sign", json!(["hello", address])));
        assert_pending!(parked.poll());
        w.popup(
            "wallet_userApprovedAuthRequest",
            json!({"authReqId": w.pending_id()}),
        )
        .await
        .unwrap();
        let signature = assert_ready_ok!(parked.poll());
        assert!(signature.as_str().unwrap().starts_with("0x"));
    }

    #[tokio::test]
    async fn test_switch_to_unknown_chain_rejected() {
        let w = wallet().await;
        w.import().await;
        w.connect().await;

        let mut parked = task::spawn(w.inpage(
            "wallet_switchEthereumChain",
            json!([{"chainId": "0x2a"}]),
        ));
        assert_pending!(parked.poll());
        let err = w
            .popup(
                "wallet_userApprovedAuthRequest",
                json!({"authReqId": w.pending_id()}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "Unrecognized chain ID 0x2a");
        let parked_err = tokio_test::assert_ready_err!(parked.poll());
        assert_eq!(parked_err.message, "Unrecognized chain ID 0x2a");
    }

    #[tokio::test]
    async fn test_add_ethereum_chain_creates_and_switches() {
        let w = wallet().await;
        w.import().await;
        w.connect().await;

        let mut parked = task::spawn(w.inpage(
            "wallet_addEthereumChain",
            json!([{
                "chainId": "0x61",
                "chainName": "BSC_TESTNET",
                "rpcUrls": ["https://bsc.example"],
            }]),
        ));
        assert_pending!(parked.poll());
        w.popup(
            "wallet_userApprovedAuthRequest",
            json!({"authReqId": w.pending_id()}),
        )
        .await
        .unwrap();
        assert_eq!(assert_ready_ok!(parked.poll()), json!(null));

        let (network, row) = w.db().network_by_name("BSC_TESTNET").unwrap();
        assert_eq!(row.net_id, 97);
        let (_, app) = w.db().app_for_origin(ORIGIN).unwrap();
        assert_eq!(app.current_network, network);
        let accounts = w
            .inpage_on("BSC_TESTNET", "eth_accounts", json!(null))
            .await
            .unwrap();
        assert!(accounts[0].as_str().unwrap().starts_with("0x"));
    }

    #[tokio::test]
    async fn test_discovery_stops_at_empty_or_failing_lookup() {
        let w = wallet().await;
        let imported = w.import().await;

        let found = w
            .popup(
                "wallet_discoverAccounts",
                json!({"accountGroupId": imported.group.get(), "limit": 3}),
            )
            .await
            .unwrap();
        assert_eq!(found, json!([]));

        w.chain.respond("cfx_getBalance", json!("0x1"));
        let found = w
            .popup(
                "wallet_discoverAccounts",
                json!({"accountGroupId": imported.group.get(), "limit": 2}),
            )
            .await
            .unwrap();
        assert_eq!(found.as_array().unwrap().len(), 2);
        assert_eq!(w.db().group_accounts(imported.group).len(), 3);

        w.chain.fail("cfx_getBalance", RpcError::internal("node down"));
        let found = w
            .popup(
                "wallet_discoverAccounts",
                json!({"accountGroupId": imported.group.get()}),
            )
            .await
            .unwrap();
        assert_eq!(found, json!([]));
    }
}
