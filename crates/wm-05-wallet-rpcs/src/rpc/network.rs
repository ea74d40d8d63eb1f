//! Network management.

use super::to_result;
use crate::views::NetworkView;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{ChainFamily, Eid, RpcError, Ticker};
use wm_01_entity_store::Network;
use wm_02_domain_model::{NetworkSpec, NetworkUpdate};
use wm_04_rpc_engine::{
    Access, EngineError, Field, MethodRegistry, MethodSpec, ParamSchema, RpcContext, RpcResult,
};

pub const CFX_HD_PATH: &str = "m/44'/503'/0'/0";
pub const ETH_HD_PATH: &str = "m/44'/60'/0'/0";

#[must_use]
pub fn default_hd_path(family: ChainFamily) -> &'static str {
    match family {
        ChainFamily::Cfx => CFX_HD_PATH,
        ChainFamily::Eth => ETH_HD_PATH,
    }
}

#[must_use]
pub fn default_ticker(family: ChainFamily) -> Ticker {
    match family {
        ChainFamily::Cfx => Ticker::new("Conflux", "CFX", 18),
        ChainFamily::Eth => Ticker::new("Ether", "ETH", 18),
    }
}

fn ticker_schema() -> ParamSchema {
    ParamSchema::object([
        Field::required("name", ParamSchema::Str),
        Field::required("symbol", ParamSchema::Str),
        Field::required("decimals", ParamSchema::Uint),
    ])
}

pub(super) fn register(registry: &mut MethodRegistry) -> Result<(), EngineError> {
    registry.register(
        MethodSpec::new("wallet_addNetwork")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::object([
                Field::required("name", ParamSchema::Str),
                Field::required("type", ParamSchema::one_of(&["cfx", "eth"])),
                Field::required("chainId", ParamSchema::Hex),
                Field::required("netId", ParamSchema::Uint),
                Field::required("endpoint", ParamSchema::Str),
                Field::optional("ticker", ticker_schema()),
                Field::optional("hdPath", ParamSchema::Str),
            ])),
        add_network,
    )?;
    registry.register(
        MethodSpec::new("wallet_updateNetwork")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::object([
                Field::required("networkId", ParamSchema::Uint),
                Field::optional("name", ParamSchema::Str),
                Field::optional("endpoint", ParamSchema::Str),
                Field::optional("chainId", ParamSchema::Hex),
                Field::optional("ticker", ticker_schema()),
            ])),
        update_network,
    )?;
    registry.register(
        MethodSpec::new("wallet_deleteNetwork")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::object([
                Field::required("networkId", ParamSchema::Uint),
                Field::required("password", ParamSchema::Str),
            ])),
        delete_network,
    )?;
    registry.register(
        MethodSpec::new("wallet_getNetwork")
            .popup()
            .allow_locked()
            .db(&[Access::Read])
            .schema(
                ParamSchema::object([
                    Field::optional("networkId", ParamSchema::Uint),
                    Field::optional("name", ParamSchema::Str),
                    Field::optional("type", ParamSchema::one_of(&["cfx", "eth"])),
                ])
                .optional(),
            ),
        get_network,
    )?;
    registry.register(
        MethodSpec::new("wallet_setCurrentNetwork")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::tuple([ParamSchema::Uint])),
        set_current_network,
    )?;
    registry.register(
        MethodSpec::new("wallet_getCurrentNetwork")
            .popup()
            .allow_locked()
            .db(&[Access::Read]),
        get_current_network,
    )?;
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddNetworkParams {
    name: String,
    #[serde(rename = "type")]
    family: ChainFamily,
    chain_id: String,
    net_id: u64,
    endpoint: String,
    ticker: Option<Ticker>,
    hd_path: Option<String>,
}

/// Add a custom network; returns its eid.
async fn add_network(ctx: RpcContext) -> RpcResult {
    let p: AddNetworkParams = ctx.params_as()?;
    let spec = NetworkSpec {
        ticker: p.ticker.unwrap_or_else(|| default_ticker(p.family)),
        hd_path: p
            .hd_path
            .unwrap_or_else(|| default_hd_path(p.family).to_string()),
        name: p.name,
        family: p.family,
        chain_id: p.chain_id,
        net_id: p.net_id,
        endpoint: p.endpoint,
        builtin: false,
    };
    let network = ctx.writer()?.create_network(spec).await?;
    Ok(json!(network))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateNetworkParams {
    network_id: Eid,
    #[serde(flatten)]
    update: NetworkUpdate,
}

/// Results cached against the old identity of the network are dropped.
async fn update_network(ctx: RpcContext) -> RpcResult {
    let p: UpdateNetworkParams = ctx.params_as()?;
    let db = ctx.writer()?;
    let before = db.require::<Network>(p.network_id)?;
    let renamed = p.update.name.clone();
    db.update_network(p.network_id, p.update)?;

    ctx.invalidate_cache(&before.name);
    if let Some(name) = renamed {
        ctx.invalidate_cache(&name);
    }
    Ok(Value::Null)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteNetworkParams {
    network_id: Eid,
    password: String,
}

async fn delete_network(ctx: RpcContext) -> RpcResult {
    let p: DeleteNetworkParams = ctx.params_as()?;
    let db = ctx.writer()?;
    db.verify_password(&p.password)?;
    let network = db.require::<Network>(p.network_id)?;
    db.delete_network(p.network_id)?;
    ctx.invalidate_cache(&network.name);
    Ok(Value::Null)
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct NetworkFilter {
    network_id: Option<Eid>,
    name: Option<String>,
    #[serde(rename = "type")]
    family: Option<ChainFamily>,
}

impl NetworkFilter {
    fn matches(&self, eid: Eid, network: &Network) -> bool {
        self.network_id.map_or(true, |id| id == eid)
            && self.name.as_ref().map_or(true, |n| *n == network.name)
            && self.family.map_or(true, |f| f == network.family)
    }
}

async fn get_network(ctx: RpcContext) -> RpcResult {
    let filter = ctx.params_as::<Option<NetworkFilter>>()?.unwrap_or_default();
    let networks: Vec<NetworkView> = ctx
        .reader()?
        .all::<Network>()
        .into_iter()
        .filter(|(eid, network)| filter.matches(*eid, network))
        .map(|(eid, network)| NetworkView { eid, network })
        .collect();
    to_result(networks)
}

async fn set_current_network(ctx: RpcContext) -> RpcResult {
    let network: Eid = ctx.arg(0)?;
    ctx.writer()?.set_selected_network(network)?;
    Ok(Value::Null)
}

async fn get_current_network(ctx: RpcContext) -> RpcResult {
    let (eid, network) = ctx
        .reader()?
        .selected_network()
        .ok_or_else(|| RpcError::internal("No network selected"))?;
    to_result(NetworkView { eid, network })
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use serde_json::json;
    use shared_types::{codes, ErrorKind};

    fn devnet() -> serde_json::Value {
        json!({
            "name": "CFX_DEVNET",
            "type": "cfx",
            "chainId": "0xbb7",
            "netId": 2999,
            "endpoint": "http://localhost:12537",
        })
    }

    #[tokio::test]
    async fn test_add_network_derives_addresses() {
        let w = wallet().await;
        let imported = w.import().await;

        let network = w.popup("wallet_addNetwork", devnet()).await.unwrap();
        let listed = w
            .popup("wallet_getNetwork", json!({"networkId": network}))
            .await
            .unwrap();
        assert_eq!(listed[0]["name"], json!("CFX_DEVNET"));
        assert_eq!(listed[0]["ticker"]["symbol"], json!("CFX"));
        assert_eq!(listed[0]["builtin"], json!(false));

        let addresses = w.db().account_addresses(imported.account);
        assert_eq!(addresses.len(), 4);
        let on_devnet = w
            .popup_on("CFX_DEVNET", "wallet_getAccountGroup", json!(null))
            .await
            .unwrap();
        assert!(on_devnet[0]["accounts"][0]["addresses"][0]["value"]
            .as_str()
            .unwrap()
            .starts_with("net2999:"));
    }

    #[tokio::test]
    async fn test_add_network_validates_shape() {
        let w = wallet().await;
        w.import().await;
        let mut bad = devnet();
        bad["type"] = json!("btc");
        let err = w.popup("wallet_addNetwork", bad).await.unwrap_err();
        assert_eq!(err.code, codes::INVALID_PARAMS);
        assert_eq!(err.data.unwrap()["explanation"]["path"], json!("params.type"));

        w.popup("wallet_addNetwork", devnet()).await.unwrap();
        let err = w.popup("wallet_addNetwork", devnet()).await.unwrap_err();
        assert_eq!(err.message, "Duplicate network name CFX_DEVNET");
    }

    #[tokio::test]
    async fn test_builtin_networks_protected() {
        let w = wallet().await;
        w.import().await;
        let (mainnet, _) = w.db().network_by_name("CFX_MAINNET").unwrap();

        let err = w
            .popup(
                "wallet_updateNetwork",
                json!({"networkId": mainnet.get(), "name": "MINE"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BuiltinProtected);

        let err = w
            .popup(
                "wallet_deleteNetwork",
                json!({"networkId": mainnet.get(), "password": PASSWORD}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BuiltinProtected);

        w.popup(
            "wallet_updateNetwork",
            json!({"networkId": mainnet.get(), "endpoint": "https://mirror.example"}),
        )
        .await
        .unwrap();
        assert_eq!(
            w.db().network_by_name("CFX_MAINNET").unwrap().1.endpoint,
            "https://mirror.example"
        );
    }

    #[tokio::test]
    async fn test_update_drops_cached_chain_id() {
        let w = wallet().await;
        w.import().await;
        let network = w.popup("wallet_addNetwork", devnet()).await.unwrap();

        for _ in 0..2 {
            let id = w.popup_on("CFX_DEVNET", "cfx_chainId", json!([])).await.unwrap();
            assert_eq!(id, json!("0xbb7"));
        }
        assert_eq!(w.chain.calls("cfx_getStatus"), 1);

        w.popup(
            "wallet_updateNetwork",
            json!({"networkId": network, "chainId": "0xbb8"}),
        )
        .await
        .unwrap();
        let id = w.popup_on("CFX_DEVNET", "cfx_chainId", json!([])).await.unwrap();
        assert_eq!(id, json!("0xbb8"));
        assert_eq!(w.chain.calls("cfx_getStatus"), 2);
    }

    #[tokio::test]
    async fn test_delete_network_keeps_accounts() {
        let w = wallet().await;
        let imported = w.import().await;
        let network = w.popup("wallet_addNetwork", devnet()).await.unwrap();
        w.popup("wallet_setCurrentNetwork", json!([network]))
            .await
            .unwrap();

        let err = w
            .popup(
                "wallet_deleteNetwork",
                json!({"networkId": network, "password": "nope"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "Invalid password");

        w.popup(
            "wallet_deleteNetwork",
            json!({"networkId": network, "password": PASSWORD}),
        )
        .await
        .unwrap();
        assert_eq!(w.db().account_addresses(imported.account).len(), 3);
        assert!(w.db().get::<wm_01_entity_store::Account>(imported.account).is_some());

        let current = w.popup("wallet_getCurrentNetwork", json!(null)).await.unwrap();
        assert_ne!(current["name"], json!("CFX_DEVNET"));
        let err = w
            .popup_on("CFX_DEVNET", "wallet_getCurrentNetwork", json!(null))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Invalid network name CFX_DEVNET");
    }

    #[tokio::test]
    async fn test_filter_by_family() {
        let w = wallet().await;
        let eth = w
            .popup("wallet_getNetwork", json!({"type": "eth"}))
            .await
            .unwrap();
        assert_eq!(eth.as_array().unwrap().len(), 1);
        assert_eq!(eth[0]["name"], json!("ETH_MAINNET"));
        assert_eq!(eth[0]["family"], json!("eth"));
    }
}
