//! # Mediator
//!
//! Owns one wired instance of every subsystem:
//!
//! ```text
//! EntityStore ──BusNotifier──▶ InMemoryEventBus ◀── WalletDb (site pushes, lock)
//!      ▲                             ▲
//!      │                             │
//!   WalletDb ◀── ConsentProtocol ────┘
//!      ▲              ▲
//!      └── Dispatcher ┘ ──▶ ChainRpc
//! ```
//!
//! Startup: validate config, build store and bus, bootstrap builtin
//! networks, register every wallet method, assemble the dispatcher.

use crate::bootstrap::bootstrap_networks;
use crate::config::MediatorConfig;
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use shared_types::{codes, ErrorKind, RpcError, RpcRequest, RpcResponse};
use std::sync::Arc;
use tracing::{debug, info};
use wm_01_entity_store::{BusNotifier, EntityStore};
use wm_02_domain_model::{HashKeyring, WalletDb};
use wm_03_consent::ConsentProtocol;
use wm_04_rpc_engine::{ChainRpc, Dispatcher, OfflineChain, RpcResult};

/// The running wallet mediator.
#[derive(Clone)]
pub struct Mediator {
    config: Arc<MediatorConfig>,
    dispatcher: Dispatcher,
    bus: Arc<InMemoryEventBus>,
}

impl Mediator {
    /// Start with the offline chain adapter.
    pub async fn start(config: MediatorConfig) -> Result<Self> {
        Self::with_chain(config, Arc::new(OfflineChain::new())).await
    }

    /// Start with a specific chain transport.
    pub async fn with_chain(config: MediatorConfig, chain: Arc<dyn ChainRpc>) -> Result<Self> {
        config.validate().context("Invalid mediator config")?;

        let bus = Arc::new(InMemoryEventBus::new());
        let store = Arc::new(EntityStore::with_notifier(Arc::new(BusNotifier::new(
            bus.clone(),
        ))));
        let db = Arc::new(
            WalletDb::new(store, Arc::new(HashKeyring::new())).with_bus(bus.clone()),
        );

        let report = bootstrap_networks(&db, &config.networks, &config.engine.primary_network)
            .await
            .context("Failed to bootstrap builtin networks")?;
        debug!(created = ?report.created, "Bootstrap report");

        let consent = Arc::new(ConsentProtocol::new(db.clone()).with_bus(bus.clone()));
        let registry = wm_05_wallet_rpcs::registry().context("Failed to build method registry")?;
        let methods = registry.len();
        let dispatcher = Dispatcher::new(config.engine.clone(), registry, db, consent, chain)
            .context("Failed to assemble dispatcher")?;

        info!(
            methods,
            primary_network = %config.engine.primary_network,
            trusted_origins = config.engine.trusted_origins.len(),
            "Wallet mediator started"
        );
        Ok(Self {
            config: Arc::new(config),
            dispatcher,
            bus,
        })
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn db(&self) -> &WalletDb {
        self.dispatcher.db()
    }

    pub fn consent(&self) -> &ConsentProtocol {
        self.dispatcher.consent()
    }

    /// Listen to pushes, store changes and consent events.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }

    pub fn dispatch(&self, request: RpcRequest) -> BoxFuture<'static, RpcResult> {
        self.dispatcher.dispatch(request)
    }

    pub async fn handle(&self, request: RpcRequest) -> RpcResponse {
        self.dispatcher.handle(request).await
    }

    /// Handle one raw JSON message. Unparseable input gets a parse error
    /// response without an id.
    pub async fn handle_json(&self, raw: &str) -> RpcResponse {
        match parse_request(raw) {
            Ok(request) => self.handle(request).await,
            Err(err) => RpcResponse::failure(None, &err),
        }
    }
}

/// Decode a wire request.
pub fn parse_request(raw: &str) -> Result<RpcRequest, RpcError> {
    serde_json::from_str(raw).map_err(|e| {
        RpcError::new(ErrorKind::Internal, format!("Parse error: {e}")).with_code(codes::PARSE_ERROR)
    })
}
