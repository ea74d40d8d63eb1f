//! Test wallet: three builtin networks, offline chain, every method registered.

use crate::rpc::{registry, CFX_HD_PATH, ETH_HD_PATH};
use serde_json::{json, Value};
use shared_bus::InMemoryEventBus;
use shared_types::{ChainFamily, RpcRequest, Ticker};
use std::future::Future;
use std::sync::Arc;
use tokio_test::{assert_pending, assert_ready_ok, task};
use wm_01_entity_store::EntityStore;
use wm_02_domain_model::{HashKeyring, ImportedVault, NetworkSpec, WalletDb};
use wm_03_consent::ConsentProtocol;
use wm_04_rpc_engine::{Dispatcher, EngineConfig, OfflineChain, RpcResult};

pub const MNEMONIC: &str =
    "error mom brown point sun magnet armor fish urge business until plastic";
pub const PASSWORD: &str = "pw";
pub const ORIGIN: &str = "https://dapp.example";
pub const ETH_ADDRESS: &str = "0x1de7fb621a141182bf6e65beabc6e8705cdff3d1";

pub struct TestWallet {
    pub dispatcher: Dispatcher,
    pub chain: Arc<OfflineChain>,
    pub bus: Arc<InMemoryEventBus>,
}

fn builtin(name: &str, family: ChainFamily, chain_id: &str, net_id: u64) -> NetworkSpec {
    let (ticker, hd_path) = match family {
        ChainFamily::Cfx => (Ticker::new("Conflux", "CFX", 18), CFX_HD_PATH),
        ChainFamily::Eth => (Ticker::new("Ether", "ETH", 18), ETH_HD_PATH),
    };
    NetworkSpec {
        name: name.to_string(),
        family,
        chain_id: chain_id.to_string(),
        net_id,
        endpoint: format!("https://{}.example", name.to_lowercase()),
        ticker,
        hd_path: hd_path.to_string(),
        builtin: true,
    }
}

/// A fresh, locked wallet with no vaults.
pub async fn wallet() -> TestWallet {
    let bus = Arc::new(InMemoryEventBus::new());
    let db = Arc::new(
        WalletDb::new(Arc::new(EntityStore::new()), Arc::new(HashKeyring::new()))
            .with_bus(bus.clone()),
    );
    for spec in [
        builtin("CFX_MAINNET", ChainFamily::Cfx, "0x405", 1029),
        builtin("CFX_TESTNET", ChainFamily::Cfx, "0x1", 1),
        builtin("ETH_MAINNET", ChainFamily::Eth, "0x1", 1),
    ] {
        db.create_network(spec).await.unwrap();
    }

    let chain = Arc::new(OfflineChain::new());
    let consent = Arc::new(ConsentProtocol::new(db.clone()).with_bus(bus.clone()));
    let dispatcher = Dispatcher::new(
        EngineConfig::default(),
        registry().unwrap(),
        db,
        consent,
        chain.clone(),
    )
    .unwrap();

    TestWallet {
        dispatcher,
        chain,
        bus,
    }
}

impl TestWallet {
    pub fn db(&self) -> &WalletDb {
        self.dispatcher.db()
    }

    pub fn consent(&self) -> &ConsentProtocol {
        self.dispatcher.consent()
    }

    pub fn popup(&self, method: &str, params: Value) -> impl Future<Output = RpcResult> + 'static {
        self.dispatcher
            .dispatch(RpcRequest::new(method, params).from_popup())
    }

    pub fn popup_on(
        &self,
        network: &str,
        method: &str,
        params: Value,
    ) -> impl Future<Output = RpcResult> + 'static {
        self.dispatcher.dispatch(
            RpcRequest::new(method, params)
                .from_popup()
                .on_network(network),
        )
    }

    pub fn inpage(&self, method: &str, params: Value) -> impl Future<Output = RpcResult> + 'static {
        self.dispatcher
            .dispatch(RpcRequest::new(method, params).from_inpage(ORIGIN))
    }

    pub fn inpage_on(
        &self,
        network: &str,
        method: &str,
        params: Value,
    ) -> impl Future<Output = RpcResult> + 'static {
        self.dispatcher.dispatch(
            RpcRequest::new(method, params)
                .from_inpage(ORIGIN)
                .on_network(network),
        )
    }

    /// Import [`MNEMONIC`], which also sets and unlocks [`PASSWORD`].
    pub async fn import(&self) -> ImportedVault {
        let imported = self
            .popup(
                "wallet_importMnemonic",
                json!({"password": PASSWORD, "mnemonic": MNEMONIC}),
            )
            .await
            .unwrap();
        serde_json::from_value(imported).unwrap()
    }

    /// Newest pending AuthReq id.
    pub fn pending_id(&self) -> u64 {
        self.consent()
            .pending_requests()
            .last()
            .map(|p| p.auth_req_id.get())
            .unwrap()
    }

    /// Grant [`ORIGIN`] the accounts permission with the selected account.
    pub async fn connect(&self) {
        let mut parked = task::spawn(self.inpage(
            "wallet_requestPermissions",
            json!([{"wallet_accounts": {}}]),
        ));
        assert_pending!(parked.poll());
        self.popup(
            "wallet_userApprovedAuthRequest",
            json!({"authReqId": self.pending_id()}),
        )
        .await
        .unwrap();
        assert_ready_ok!(parked.poll());
    }

    pub fn app_id(&self) -> u64 {
        self.db().app_for_origin(ORIGIN).unwrap().0.get()
    }
}
