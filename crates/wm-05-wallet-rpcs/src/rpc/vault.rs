//! Vault import, account groups and accounts.

use super::to_result;
use crate::views::{AccountView, GroupView, VaultView};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{Eid, RpcError, VaultKind};
use wm_01_entity_store::{Account, AccountGroup, Vault};
use wm_02_domain_model::{AccountUpdate, GroupUpdate};
use wm_04_rpc_engine::{
    Access, EngineError, Field, MethodRegistry, MethodSpec, ParamSchema, RpcContext, RpcResult,
};

pub(super) fn register(registry: &mut MethodRegistry) -> Result<(), EngineError> {
    registry.register(import_spec("wallet_importMnemonic", "mnemonic"), import_mnemonic)?;
    registry.register(import_spec("wallet_importPrivateKey", "privateKey"), import_private_key)?;
    registry.register(import_spec("wallet_importAddress", "address"), import_address)?;
    registry.register(
        MethodSpec::new("wallet_getVaults").popup().db(&[Access::Read]),
        get_vaults,
    )?;
    registry.register(
        MethodSpec::new("wallet_createAccount")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::object([
                Field::required("accountGroupId", ParamSchema::Uint),
                Field::optional("nickname", ParamSchema::Str),
            ])),
        create_account,
    )?;
    registry.register(
        MethodSpec::new("wallet_updateAccount")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::object([
                Field::required("accountId", ParamSchema::Uint),
                Field::optional("nickname", ParamSchema::Str),
                Field::optional("hidden", ParamSchema::Bool),
            ])),
        update_account,
    )?;
    registry.register(
        MethodSpec::new("wallet_updateAccountGroup")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::object([
                Field::required("accountGroupId", ParamSchema::Uint),
                Field::optional("nickname", ParamSchema::Str),
                Field::optional("hidden", ParamSchema::Bool),
            ])),
        update_account_group,
    )?;
    registry.register(
        MethodSpec::new("wallet_getAccountGroup")
            .popup()
            .db(&[Access::Read])
            .schema(
                ParamSchema::object([
                    Field::optional("type", ParamSchema::one_of(&["hd", "pk", "pub"])),
                    Field::optional("includeHidden", ParamSchema::Bool),
                ])
                .optional(),
            ),
        get_account_group,
    )?;
    registry.register(
        MethodSpec::new("wallet_deleteAccountGroup")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::object([
                Field::required("accountGroupId", ParamSchema::Uint),
                Field::required("password", ParamSchema::Str),
            ])),
        delete_account_group,
    )?;
    registry.register(
        MethodSpec::new("wallet_exportAccount")
            .popup()
            .db(&[Access::Read, Access::Keys])
            .schema(ParamSchema::object([
                Field::required("accountId", ParamSchema::Uint),
                Field::required("password", ParamSchema::Str),
            ])),
        export_account,
    )?;
    registry.register(
        MethodSpec::new("wallet_setCurrentAccount")
            .popup()
            .db(&[Access::Write])
            .schema(ParamSchema::tuple([ParamSchema::Uint])),
        set_current_account,
    )?;
    registry.register(
        MethodSpec::new("wallet_getCurrentAccount")
            .popup()
            .db(&[Access::Read]),
        get_current_account,
    )?;
    Ok(())
}

// =============================================================================
// IMPORT
// =============================================================================

/// Imports run while locked: the first one sets the wallet password.
fn import_spec(name: &'static str, secret_field: &'static str) -> MethodSpec {
    MethodSpec::new(name)
        .popup()
        .allow_locked()
        .db(&[Access::Write])
        .schema(ParamSchema::object([
            Field::required("password", ParamSchema::Str),
            Field::required(secret_field, ParamSchema::Str),
            Field::optional("nickname", ParamSchema::Str),
        ]))
}

#[derive(Deserialize)]
struct ImportParams {
    password: String,
    #[serde(alias = "mnemonic", alias = "privateKey", alias = "address")]
    secret: String,
    nickname: Option<String>,
}

async fn import_mnemonic(ctx: RpcContext) -> RpcResult {
    let p: ImportParams = ctx.params_as()?;
    to_result(ctx.writer()?.import_mnemonic(&p.password, &p.secret, p.nickname).await?)
}

async fn import_private_key(ctx: RpcContext) -> RpcResult {
    let p: ImportParams = ctx.params_as()?;
    to_result(ctx.writer()?.import_private_key(&p.password, &p.secret, p.nickname).await?)
}

async fn import_address(ctx: RpcContext) -> RpcResult {
    let p: ImportParams = ctx.params_as()?;
    to_result(ctx.writer()?.import_address(&p.password, &p.secret, p.nickname).await?)
}

async fn get_vaults(ctx: RpcContext) -> RpcResult {
    let db = ctx.reader()?;
    let vaults: Vec<VaultView> = db
        .all::<Vault>()
        .into_iter()
        .map(|(eid, vault)| VaultView::new(db, eid, vault))
        .collect();
    to_result(vaults)
}

// =============================================================================
// GROUPS AND ACCOUNTS
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountParams {
    account_group_id: Option<Eid>,
    account_id: Option<Eid>,
    nickname: Option<String>,
    hidden: Option<bool>,
}

impl AccountParams {
    fn group(&self) -> Result<Eid, RpcError> {
        self.account_group_id
            .ok_or_else(|| RpcError::invalid_params("Missing accountGroupId"))
    }

    fn account(&self) -> Result<Eid, RpcError> {
        self.account_id
            .ok_or_else(|| RpcError::invalid_params("Missing accountId"))
    }
}

async fn create_account(ctx: RpcContext) -> RpcResult {
    let p: AccountParams = ctx.params_as()?;
    let db = ctx.writer()?;
    let account = db.create_account(p.group()?, p.nickname).await?;
    let row = db.require::<Account>(account)?;
    to_result(AccountView::everywhere(db, account, row))
}

async fn update_account(ctx: RpcContext) -> RpcResult {
    let p: AccountParams = ctx.params_as()?;
    ctx.writer()?.update_account(
        p.account()?,
        AccountUpdate {
            nickname: p.nickname,
            hidden: p.hidden,
        },
    )?;
    Ok(Value::Null)
}

async fn update_account_group(ctx: RpcContext) -> RpcResult {
    let p: AccountParams = ctx.params_as()?;
    ctx.writer()?.update_account_group(
        p.group()?,
        GroupUpdate {
            nickname: p.nickname,
            hidden: p.hidden,
        },
    )?;
    Ok(Value::Null)
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GroupFilter {
    #[serde(rename = "type")]
    kind: Option<VaultKind>,
    #[serde(default)]
    include_hidden: bool,
}

/// Groups with their accounts, each showing its address on the request's
/// network.
async fn get_account_group(ctx: RpcContext) -> RpcResult {
    let filter = ctx.params_as::<Option<GroupFilter>>()?.unwrap_or_default();
    let db = ctx.reader()?;
    let network = ctx.network_eid();

    let groups: Vec<GroupView> = db
        .all::<AccountGroup>()
        .into_iter()
        .filter(|(_, g)| filter.include_hidden || !g.hidden)
        .filter_map(|(eid, group)| {
            let kind = db.get::<Vault>(group.vault)?.kind;
            if filter.kind.is_some_and(|k| k != kind) {
                return None;
            }
            let accounts = db
                .group_accounts(eid)
                .into_iter()
                .filter(|(_, a)| filter.include_hidden || !a.hidden)
                .map(|(account, row)| AccountView::on_network(db, account, row, network))
                .collect();
            Some(GroupView::new(eid, group, kind, accounts))
        })
        .collect();
    to_result(groups)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuardedParams {
    #[serde(alias = "accountId", alias = "accountGroupId")]
    id: Eid,
    password: String,
}

async fn delete_account_group(ctx: RpcContext) -> RpcResult {
    let p: GuardedParams = ctx.params_as()?;
    let db = ctx.writer()?;
    db.verify_password(&p.password)?;
    db.delete_account_group(p.id)?;
    Ok(Value::Null)
}

/// Private key of the account's address on the request's network.
async fn export_account(ctx: RpcContext) -> RpcResult {
    let p: GuardedParams = ctx.params_as()?;
    let db = ctx.reader()?;
    db.verify_password(&p.password)?;
    db.require::<Account>(p.id)?;
    let (address, _) = db
        .account_address_on_network(p.id, ctx.network_eid())
        .ok_or_else(|| {
            RpcError::not_allowed(format!(
                "Account {} has no address on network {}",
                p.id,
                ctx.network().name
            ))
        })?;
    let pk = ctx.keys()?.address_private_key(address).await?;
    Ok(Value::String(pk))
}

async fn set_current_account(ctx: RpcContext) -> RpcResult {
    let account: Eid = ctx.arg(0)?;
    ctx.writer()?.set_selected_account(account)?;
    Ok(Value::Null)
}

async fn get_current_account(ctx: RpcContext) -> RpcResult {
    let db = ctx.reader()?;
    match db.selected_account() {
        Some((eid, account)) => to_result(AccountView::everywhere(db, eid, account)),
        None => Ok(Value::Null),
    }
}
