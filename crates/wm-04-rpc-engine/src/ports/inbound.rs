//! Method bodies plugged into the dispatcher.

use crate::service::RpcContext;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::RpcError;
use std::future::Future;

pub type RpcResult = Result<Value, RpcError>;

/// Body of a registered method.
///
/// Any `Fn(RpcContext) -> impl Future<Output = RpcResult>` is a handler, so
/// plain `async fn handler(ctx: RpcContext) -> RpcResult` functions register
/// directly.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn call(&self, ctx: RpcContext) -> RpcResult;
}

#[async_trait]
impl<F, Fut> MethodHandler for F
where
    F: Fn(RpcContext) -> Fut + Send + Sync,
    Fut: Future<Output = RpcResult> + Send,
{
    async fn call(&self, ctx: RpcContext) -> RpcResult {
        self(ctx).await
    }
}
