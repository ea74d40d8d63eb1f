//! Lock state.

use serde::Deserialize;
use serde_json::{json, Value};
use wm_04_rpc_engine::{
    Access, EngineError, Field, MethodRegistry, MethodSpec, ParamSchema, RpcContext, RpcResult,
};

pub(super) fn register(registry: &mut MethodRegistry) -> Result<(), EngineError> {
    registry.register(
        MethodSpec::new("wallet_isLocked")
            .popup()
            .allow_locked()
            .db(&[Access::Read]),
        is_locked,
    )?;
    registry.register(
        MethodSpec::new("wallet_lock")
            .popup()
            .allow_locked()
            .db(&[Access::Write]),
        lock,
    )?;
    registry.register(
        MethodSpec::new("wallet_unlock")
            .popup()
            .allow_locked()
            .db(&[Access::Write])
            .schema(ParamSchema::object([Field::required(
                "password",
                ParamSchema::Str,
            )])),
        unlock,
    )?;
    Ok(())
}

#[derive(Deserialize)]
struct PasswordParams {
    password: String,
}

async fn is_locked(ctx: RpcContext) -> RpcResult {
    Ok(json!(ctx.reader()?.is_locked()))
}

async fn lock(ctx: RpcContext) -> RpcResult {
    ctx.writer()?.lock()?;
    Ok(Value::Null)
}

async fn unlock(ctx: RpcContext) -> RpcResult {
    let params: PasswordParams = ctx.params_as()?;
    ctx.writer()?.unlock(&params.password)?;
    Ok(Value::Null)
}
