//! Sites, App grants and per-App selection.

use super::{original_arg, resolving, to_result};
use crate::views::{permissions_value, AppView};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use shared_types::{Eid, Permission, RpcError};
use std::collections::BTreeSet;
use tracing::info;
use wm_01_entity_store::{App, Network, Site};
use wm_04_rpc_engine::{
    Access, EngineError, Field, MethodRegistry, MethodSpec, ParamSchema, RpcContext, RpcResult,
};

/// Names accepted as keys of a permission request.
const PERMISSION_NAMES: &[&str] = &["wallet_basic", "wallet_accounts", "cfx_accounts", "eth_accounts"];

fn app_update_schema(target: &'static str) -> ParamSchema {
    ParamSchema::object([
        Field::required("appId", ParamSchema::Uint),
        Field::required(target, ParamSchema::Uint),
    ])
}

pub(super) fn register(registry: &mut MethodRegistry) -> Result<(), EngineError> {
    registry.register(
        MethodSpec::new("wallet_registerSiteMetadata")
            .inpage()
            .allow_locked()
            .db(&[Access::Write])
            .schema(ParamSchema::object([
                Field::optional("name", ParamSchema::Str),
                Field::optional("icon", ParamSchema::Str),
            ])),
        register_site_metadata,
    )?;
    registry.register(
        MethodSpec::new("wallet_requestPermissions")
            .inpage()
            .popup()
            .allow_locked()
            .consent()
            .db(&[Access::Write])
            .schema(ParamSchema::or([
                ParamSchema::tuple([ParamSchema::keys(PERMISSION_NAMES, ParamSchema::Any)]),
                ParamSchema::object([
                    Field::required("authReqId", ParamSchema::Uint),
                    Field::optional("accounts", ParamSchema::array_of(ParamSchema::Uint)),
                ]),
            ]))
            .normalize(normalize_permission_request),
        request_permissions,
    )?;
    registry.register(
        MethodSpec::new("wallet_getPermissions")
            .inpage()
            .allow_locked()
            .db(&[Access::Read]),
        get_permissions,
    )?;
    registry.register(
        MethodSpec::new("wallet_getApps").popup().db(&[Access::Read]),
        get_apps,
    )?;
    registry.register(
        MethodSpec::new("wallet_deleteApp")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::object([Field::required("appId", ParamSchema::Uint)])),
        delete_app,
    )?;
    registry.register(
        MethodSpec::new("wallet_setAppCurrentAccount")
            .popup()
            .db(&[Access::Write])
            .schema(app_update_schema("accountId")),
        set_app_current_account,
    )?;
    registry.register(
        MethodSpec::new("wallet_setAppCurrentNetwork")
            .popup()
            .db(&[Access::Write])
            .schema(app_update_schema("networkId")),
        set_app_current_network,
    )?;
    registry.register(
        MethodSpec::new("wallet_revokeAccountFromApp")
            .popup()
            .db(&[Access::Write])
            .schema(app_update_schema("accountId")),
        revoke_account_from_app,
    )?;
    Ok(())
}

// =============================================================================
// SITES AND GRANTS
// =============================================================================

#[derive(Deserialize)]
struct SiteMetadata {
    name: Option<String>,
    icon: Option<String>,
}

/// Record the calling site and push `connect` with the chain it sees.
async fn register_site_metadata(ctx: RpcContext) -> RpcResult {
    let meta: SiteMetadata = ctx.params_as()?;
    let origin = ctx.require_origin()?;
    let db = ctx.writer()?;
    db.upsert_site(origin, meta.name, meta.icon)?;

    let network = db
        .app_for_origin(origin)
        .and_then(|(_, app)| db.get::<Network>(app.current_network))
        .or_else(|| db.selected_network().map(|(_, n)| n));
    if let Some(network) = network {
        db.push_to_site(
            origin,
            "connect",
            json!({
                "chainId": network.chain_id,
                "networkId": network.net_id.to_string(),
            }),
        );
    }
    Ok(json!("0x1"))
}

/// Canonical form of a page's permission request: `wallet_basic` is always
/// included and the per-family account aliases become `wallet_accounts`.
fn normalize_permission_request(params: &mut Value) {
    let Some(Value::Object(requested)) = params.get_mut(0) else {
        return;
    };
    let mut normalized = Map::new();
    normalized.insert(Permission::WalletBasic.name().into(), json!({}));
    for (name, caveats) in std::mem::take(requested) {
        if let Some(permission) = Permission::from_name(&name) {
            normalized.entry(permission.name()).or_insert(caveats);
        }
    }
    *requested = normalized;
}

#[derive(Deserialize)]
struct PermissionDecision {
    accounts: Option<Vec<Eid>>,
}

/// Popup resolution of a permission request.
///
/// Grants the requested permissions with the chosen accounts (the selected
/// account when none are chosen). A decision without an account for a
/// request that needs one is a denial. A new App starts on the network the
/// page asked from.
async fn request_permissions(ctx: RpcContext) -> RpcResult {
    let (auth_req_id, auth_req) = resolving(&ctx)?;
    let decision: PermissionDecision = ctx.params_as()?;
    let db = ctx.writer()?;

    let requested = original_arg(&auth_req, 0);
    let perms: BTreeSet<Permission> = requested
        .as_object()
        .map(|keys| keys.keys().filter_map(|k| Permission::from_name(k)).collect())
        .unwrap_or_default();
    let wants_accounts = perms.contains(&Permission::WalletAccounts);

    let accounts = match decision.accounts {
        Some(accounts) => accounts,
        None if wants_accounts => db
            .selected_account()
            .map(|(eid, _)| vec![eid])
            .unwrap_or_default(),
        None => Vec::new(),
    };
    if wants_accounts && accounts.is_empty() {
        info!(auth_req = %auth_req_id, "Permission request denied, no account chosen");
        return Err(RpcError::user_rejected());
    }

    let existed = db.app_for_site(auth_req.site).is_some();
    let app = db.grant_or_merge_app(auth_req.site, &perms, &accounts)?;
    if !existed {
        db.set_app_current_network(app, ctx.network_eid())?;
    }
    info!(auth_req = %auth_req_id, app = %app, "Permissions granted");

    let site = db.require::<Site>(auth_req.site)?;
    db.push_to_site(
        &site.origin,
        "accountsChanged",
        db.site_accounts_value(&site.origin),
    );
    let granted = db.require::<App>(app)?;
    Ok(permissions_value(&granted.perms))
}

async fn get_permissions(ctx: RpcContext) -> RpcResult {
    let origin = ctx.require_origin()?;
    let perms = ctx
        .reader()?
        .app_for_origin(origin)
        .map(|(_, app)| app.perms)
        .unwrap_or_default();
    Ok(permissions_value(&perms))
}

async fn get_apps(ctx: RpcContext) -> RpcResult {
    let db = ctx.reader()?;
    let apps: Vec<AppView> = db
        .all::<App>()
        .into_iter()
        .filter_map(|(eid, app)| {
            let site = db.get::<Site>(app.site)?;
            Some(AppView::new(db, eid, app, site))
        })
        .collect();
    to_result(apps)
}

// =============================================================================
// APP MAINTENANCE
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppParams {
    app_id: Eid,
    account_id: Option<Eid>,
    network_id: Option<Eid>,
}

impl AppParams {
    fn account(&self) -> Result<Eid, RpcError> {
        self.account_id
            .ok_or_else(|| RpcError::invalid_params("Missing accountId"))
    }

    fn network(&self) -> Result<Eid, RpcError> {
        self.network_id
            .ok_or_else(|| RpcError::invalid_params("Missing networkId"))
    }
}

async fn delete_app(ctx: RpcContext) -> RpcResult {
    let p: AppParams = ctx.params_as()?;
    ctx.writer()?.delete_app(p.app_id)?;
    Ok(Value::Null)
}

/// No-op unless the account is authorized for the App.
async fn set_app_current_account(ctx: RpcContext) -> RpcResult {
    let p: AppParams = ctx.params_as()?;
    let changed = ctx.writer()?.set_app_current_account(p.app_id, p.account()?)?;
    Ok(json!(changed))
}

async fn set_app_current_network(ctx: RpcContext) -> RpcResult {
    let p: AppParams = ctx.params_as()?;
    ctx.writer()?.set_app_current_network(p.app_id, p.network()?)?;
    Ok(Value::Null)
}

async fn revoke_account_from_app(ctx: RpcContext) -> RpcResult {
    let p: AppParams = ctx.params_as()?;
    ctx.writer()?.revoke_account_from_app(p.app_id, p.account()?)?;
    Ok(Value::Null)
}
