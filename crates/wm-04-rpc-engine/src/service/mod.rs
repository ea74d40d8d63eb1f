//! # RPC Dispatcher
//!
//! Routes a request through the validation pipeline and into its handler.
//!
//! ## Pipeline
//!
//! | Step | Check | Failure |
//! |------|-------|---------|
//! | 1 | method is registered | MethodNotFound |
//! | 2 | origin scope: internal, trusted and unflagged callers pass, then caller kind | MethodNotFound |
//! | 3 | lock state | MethodNotFound "wallet is locked" |
//! | 4 | network resolution, defaulting to the primary network | InvalidParams |
//! | 5 | block/epoch reference defaulting | never fails |
//! | 6 | method family matches network family | MethodNotFound |
//! | 7 | params schema, then normalization | InvalidParams with explanation |
//! | 8 | consent parking, resolution, cache, handler | handler errors |
//!
//! Steps 1-7 never mutate state. Every error leaving the dispatcher carries
//! the request that produced it.

mod context;
mod pipeline;


pub use context::RpcContext;

use crate::domain::{EngineConfig, EngineError, MethodRegistry, TtlCache};
use crate::ports::{ChainRpc, RpcResult};
use futures::future::{BoxFuture, FutureExt};
use shared_types::{RpcRequest, RpcResponse};
use std::sync::Arc;
use tracing::{debug_span, Instrument};
use wm_02_domain_model::WalletDb;
use wm_03_consent::ConsentProtocol;

/// Cheaply cloneable handle to the engine.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    config: EngineConfig,
    registry: MethodRegistry,
    db: Arc<WalletDb>,
    consent: Arc<ConsentProtocol>,
    chain: Arc<dyn ChainRpc>,
    cache: TtlCache,
}

impl Dispatcher {
    /// Assemble a dispatcher, validating the config and the registry.
    pub fn new(
        config: EngineConfig,
        registry: MethodRegistry,
        db: Arc<WalletDb>,
        consent: Arc<ConsentProtocol>,
        chain: Arc<dyn ChainRpc>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        registry.validate()?;
        let cache = TtlCache::new(config.cache_capacity);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                registry,
                db,
                consent,
                chain,
                cache,
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.inner.registry
    }

    pub fn db(&self) -> &Arc<WalletDb> {
        &self.inner.db
    }

    pub fn consent(&self) -> &Arc<ConsentProtocol> {
        &self.inner.consent
    }

    pub fn chain(&self) -> &Arc<dyn ChainRpc> {
        &self.inner.chain
    }

    pub fn cache(&self) -> &TtlCache {
        &self.inner.cache
    }

    /// Run `request` through the pipeline.
    ///
    /// Boxed so that handlers can dispatch nested calls.
    pub fn dispatch(&self, request: RpcRequest) -> BoxFuture<'static, RpcResult> {
        let this = self.clone();
        let span = debug_span!(
            "rpc",
            method = %request.method,
            internal = request.is_internal(),
            inpage = request.inpage,
            popup = request.popup,
        );
        async move {
            let original = request.clone();
            this.run(request)
                .await
                .map_err(|err| err.with_request(&original))
        }
        .instrument(span)
        .boxed()
    }

    /// Dispatch and wrap the outcome in a response envelope.
    pub async fn handle(&self, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone();
        RpcResponse::from_result(id, self.dispatch(request).await)
    }
}
