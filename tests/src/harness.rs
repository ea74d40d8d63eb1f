//! # Test Harness
//!
//! A wire-level client for a [`Mediator`] started from the default config,
//! so flows run through the same startup path as the binary.

use futures::future::BoxFuture;
use mediator_runtime::{Mediator, MediatorConfig};
use serde_json::{json, Value};
use shared_bus::{EventFilter, EventTopic, WalletEvent};
use shared_types::{RpcError, RpcRequest};
use tokio::task::JoinHandle;
use wm_02_domain_model::ImportedVault;
use wm_04_rpc_engine::RpcResult;

pub const MNEMONIC: &str =
    "error mom brown point sun magnet armor fish urge business until plastic";
pub const PRIVATE_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const WATCH_ADDRESS: &str = "0x1de7fb621a141182bf6e65beabc6e8705cdff3d1";
pub const PASSWORD: &str = "correct horse";
pub const ORIGIN: &str = "https://dapp.example";
pub const OTHER_ORIGIN: &str = "https://other.example";

/// A parked page call and the AuthReq it opened.
pub struct Parked {
    pub auth_req: u64,
    pub call: JoinHandle<RpcResult>,
}

impl Parked {
    /// Wait for the page call to settle.
    pub async fn outcome(self) -> RpcResult {
        self.call
            .await
            .map_err(|e| RpcError::internal(format!("parked call panicked: {e}")))?
    }
}

/// Mediator plus request builders for each caller kind.
#[derive(Clone)]
pub struct Client {
    pub mediator: Mediator,
}

impl Client {
    /// Mediator from [`MediatorConfig::default`].
    pub async fn start() -> Result<Self, RpcError> {
        Self::with_config(MediatorConfig::default()).await
    }

    pub async fn with_config(config: MediatorConfig) -> Result<Self, RpcError> {
        let mediator = Mediator::start(config)
            .await
            .map_err(|e| RpcError::internal(format!("{e:#}")))?;
        Ok(Self { mediator })
    }

    pub fn send(&self, request: RpcRequest) -> BoxFuture<'static, RpcResult> {
        self.mediator.dispatch(request)
    }

    pub fn popup(&self, method: &str, params: Value) -> BoxFuture<'static, RpcResult> {
        self.send(RpcRequest::new(method, params).from_popup())
    }

    pub fn popup_on(
        &self,
        network: &str,
        method: &str,
        params: Value,
    ) -> BoxFuture<'static, RpcResult> {
        self.send(
            RpcRequest::new(method, params)
                .from_popup()
                .on_network(network),
        )
    }

    pub fn inpage(&self, origin: &str, method: &str, params: Value) -> BoxFuture<'static, RpcResult> {
        self.send(RpcRequest::new(method, params).from_inpage(origin))
    }

    /// Start a consent-gated page call and wait until its AuthReq exists.
    pub async fn park(&self, request: RpcRequest) -> Result<Parked, RpcError> {
        let mut consent = self
            .mediator
            .subscribe(EventFilter::topics(vec![EventTopic::Consent]));
        let call = tokio::spawn(self.send(request));

        while let Some(event) = consent.recv().await {
            if let WalletEvent::AuthRequested { auth_req, .. } = event {
                return Ok(Parked {
                    auth_req: auth_req.get(),
                    call,
                });
            }
        }
        Err(RpcError::internal("event bus closed before the call parked"))
    }

    pub async fn park_inpage(
        &self,
        origin: &str,
        method: &str,
        params: Value,
    ) -> Result<Parked, RpcError> {
        self.park(RpcRequest::new(method, params).from_inpage(origin))
            .await
    }

    pub async fn approve(&self, auth_req: u64, res: Value) -> RpcResult {
        let mut params = json!({ "authReqId": auth_req });
        if !res.is_null() {
            params["res"] = res;
        }
        self.popup("wallet_userApprovedAuthRequest", params).await
    }

    pub async fn reject(&self, auth_req: u64) -> RpcResult {
        self.popup(
            "wallet_userRejectedAuthRequest",
            json!({ "authReqId": auth_req }),
        )
        .await
    }

    /// Import [`MNEMONIC`]; the first import also sets [`PASSWORD`].
    pub async fn import_mnemonic(&self) -> Result<ImportedVault, RpcError> {
        let imported = self
            .popup(
                "wallet_importMnemonic",
                json!({ "password": PASSWORD, "mnemonic": MNEMONIC }),
            )
            .await?;
        serde_json::from_value(imported)
            .map_err(|e| RpcError::internal(format!("unexpected import result: {e}")))
    }

    /// Grant `origin` the accounts permission for the selected account.
    pub async fn connect(&self, origin: &str) -> RpcResult {
        let parked = self
            .park_inpage(
                origin,
                "wallet_requestPermissions",
                json!([{ "wallet_accounts": {} }]),
            )
            .await?;
        self.approve(parked.auth_req, Value::Null).await?;
        parked.outcome().await
    }
}
