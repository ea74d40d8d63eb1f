//! Entity kinds held by the store.
//!
//! Each struct is one row of its kind's table. Reference fields hold the
//! [`Eid`] of the owning or referenced entity.

use super::attrs::{Attr, AttrName, Attributes};
use serde::{Deserialize, Serialize};
use shared_types::{ChainFamily, Eid, Permission, RpcRequest, Ticker, VaultKind};
use std::collections::BTreeSet;

/// Named HD derivation path, e.g. `m/44'/503'/0'/0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdPath {
    pub name: String,
    pub value: String,
}

/// A chain endpoint the wallet can talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,
    pub family: ChainFamily,
    pub chain_id: String,
    pub net_id: u64,
    pub endpoint: String,
    pub ticker: Ticker,
    pub hd_path: Eid,
    pub builtin: bool,
    pub selected: bool,
}

/// Credential source.
///
/// `ddata` is ciphertext for `hd`/`pk` and absent for `pub`, which keeps the
/// imported public `address` instead. `fingerprint` identifies the credential
/// without revealing it and is unique across vaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub kind: VaultKind,
    #[serde(skip_serializing)]
    pub ddata: Option<String>,
    #[serde(skip_serializing)]
    pub fingerprint: String,
    pub address: Option<String>,
    /// Family of the imported address, for `pub` vaults only.
    pub family: Option<ChainFamily>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountGroup {
    pub vault: Eid,
    pub nickname: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub group: Eid,
    /// Derivation index within the group (0 for `pk`/`pub` vaults).
    pub index: u32,
    pub nickname: String,
    pub hidden: bool,
    pub selected: bool,
}

/// Per-network materialisation of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub account: Eid,
    pub network: Eid,
    pub index: u32,
    pub hex: String,
    pub cfx_hex: Option<String>,
    pub base32: Option<String>,
    /// Cached private key. Evictable; recomputed from the vault when absent.
    #[serde(skip_serializing)]
    pub pk: Option<String>,
}

impl Address {
    /// The user-facing form: base32 on cfx networks, hex elsewhere.
    #[must_use]
    pub fn value(&self) -> &str {
        self.base32.as_deref().unwrap_or(&self.hex)
    }
}

/// Dapp origin record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub origin: String,
    pub name: Option<String>,
    pub icon: Option<String>,
}

/// Authorization granted to one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub site: Eid,
    pub perms: BTreeSet<Permission>,
    /// Authorized accounts, in grant order.
    pub accounts: Vec<Eid>,
    pub current_account: Option<Eid>,
    pub current_network: Eid,
    /// Unix milliseconds of the first grant.
    pub created_at: i64,
}

/// How a consent request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthOutcome {
    Approved { app: Option<Eid> },
    Rejected { code: i32, message: String },
}

/// A consent request awaiting a user decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthReq {
    pub site: Eid,
    pub request: RpcRequest,
    pub outcome: Option<AuthOutcome>,
}

// =============================================================================
// ATTRIBUTE ACCESS
// =============================================================================

impl Attributes for HdPath {
    fn references(&self) -> Vec<Eid> {
        Vec::new()
    }

    fn attr(&self, name: AttrName) -> Option<Attr> {
        match name {
            AttrName::Name => Some(Attr::Name(self.name.clone())),
            AttrName::Value => Some(Attr::Value(self.value.clone())),
            _ => None,
        }
    }

    fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        match attr {
            Attr::Name(v) => self.name = v,
            other => return Err(other),
        }
        Ok(())
    }

    fn retract(&mut self, _name: AttrName) -> bool {
        false
    }
}

impl Attributes for Network {
    fn references(&self) -> Vec<Eid> {
        vec![self.hd_path]
    }

    fn attr(&self, name: AttrName) -> Option<Attr> {
        Some(match name {
            AttrName::Name => Attr::Name(self.name.clone()),
            AttrName::Family => Attr::Family(self.family),
            AttrName::ChainId => Attr::ChainId(self.chain_id.clone()),
            AttrName::NetId => Attr::NetId(self.net_id),
            AttrName::Endpoint => Attr::Endpoint(self.endpoint.clone()),
            AttrName::Ticker => Attr::Ticker(self.ticker.clone()),
            AttrName::HdPath => Attr::HdPath(self.hd_path),
            AttrName::Builtin => Attr::Builtin(self.builtin),
            AttrName::Selected => Attr::Selected(self.selected),
            _ => return None,
        })
    }

    fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        match attr {
            Attr::Name(v) => self.name = v,
            Attr::Endpoint(v) => self.endpoint = v,
            Attr::ChainId(v) => self.chain_id = v,
            Attr::NetId(v) => self.net_id = v,
            Attr::Ticker(v) => self.ticker = v,
            Attr::Selected(v) => self.selected = v,
            other => return Err(other),
        }
        Ok(())
    }

    fn retract(&mut self, _name: AttrName) -> bool {
        false
    }
}

impl Attributes for Vault {
    fn references(&self) -> Vec<Eid> {
        Vec::new()
    }

    fn attr(&self, name: AttrName) -> Option<Attr> {
        match name {
            AttrName::Kind => Some(Attr::Kind(self.kind)),
            AttrName::Fingerprint => Some(Attr::Fingerprint(self.fingerprint.clone())),
            AttrName::Family => self.family.map(Attr::Family),
            _ => None,
        }
    }

    fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        Err(attr)
    }

    fn retract(&mut self, _name: AttrName) -> bool {
        false
    }
}

impl Attributes for AccountGroup {
    fn references(&self) -> Vec<Eid> {
        vec![self.vault]
    }

    fn attr(&self, name: AttrName) -> Option<Attr> {
        match name {
            AttrName::Vault => Some(Attr::Vault(self.vault)),
            AttrName::Nickname => Some(Attr::Nickname(self.nickname.clone())),
            AttrName::Hidden => Some(Attr::Hidden(self.hidden)),
            _ => None,
        }
    }

    fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        match attr {
            Attr::Nickname(v) => self.nickname = v,
            Attr::Hidden(v) => self.hidden = v,
            other => return Err(other),
        }
        Ok(())
    }

    fn retract(&mut self, _name: AttrName) -> bool {
        false
    }
}

impl Attributes for Account {
    fn references(&self) -> Vec<Eid> {
        vec![self.group]
    }

    fn attr(&self, name: AttrName) -> Option<Attr> {
        match name {
            AttrName::Group => Some(Attr::Group(self.group)),
            AttrName::Index => Some(Attr::Index(self.index)),
            AttrName::Nickname => Some(Attr::Nickname(self.nickname.clone())),
            AttrName::Hidden => Some(Attr::Hidden(self.hidden)),
            AttrName::Selected => Some(Attr::Selected(self.selected)),
            _ => None,
        }
    }

    fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        match attr {
            Attr::Nickname(v) => self.nickname = v,
            Attr::Hidden(v) => self.hidden = v,
            Attr::Selected(v) => self.selected = v,
            other => return Err(other),
        }
        Ok(())
    }

    fn retract(&mut self, _name: AttrName) -> bool {
        false
    }
}

impl Attributes for Address {
    fn references(&self) -> Vec<Eid> {
        vec![self.account, self.network]
    }

    fn attr(&self, name: AttrName) -> Option<Attr> {
        match name {
            AttrName::Account => Some(Attr::Account(self.account)),
            AttrName::Network => Some(Attr::Network(self.network)),
            AttrName::Index => Some(Attr::Index(self.index)),
            AttrName::Hex => Some(Attr::Hex(self.hex.clone())),
            AttrName::Base32 => self.base32.clone().map(Attr::Base32),
            AttrName::Value => Some(Attr::Value(self.value().to_string())),
            AttrName::PrivateKey => self.pk.clone().map(Attr::PrivateKey),
            _ => None,
        }
    }

    fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        match attr {
            Attr::PrivateKey(v) => self.pk = Some(v),
            other => return Err(other),
        }
        Ok(())
    }

    fn retract(&mut self, name: AttrName) -> bool {
        match name {
            AttrName::PrivateKey => {
                self.pk = None;
                true
            }
            _ => false,
        }
    }
}

impl Attributes for Site {
    fn references(&self) -> Vec<Eid> {
        Vec::new()
    }

    fn attr(&self, name: AttrName) -> Option<Attr> {
        match name {
            AttrName::Origin => Some(Attr::Origin(self.origin.clone())),
            AttrName::Name => self.name.clone().map(Attr::Name),
            AttrName::Icon => self.icon.clone().map(Attr::Icon),
            _ => None,
        }
    }

    fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        match attr {
            Attr::Name(v) => self.name = Some(v),
            Attr::Icon(v) => self.icon = Some(v),
            other => return Err(other),
        }
        Ok(())
    }

    fn retract(&mut self, name: AttrName) -> bool {
        match name {
            AttrName::Name => self.name = None,
            AttrName::Icon => self.icon = None,
            _ => return false,
        }
        true
    }
}

impl Attributes for App {
    fn references(&self) -> Vec<Eid> {
        let mut refs = vec![self.site, self.current_network];
        refs.extend(self.accounts.iter().copied());
        refs.extend(self.current_account);
        refs
    }

    fn attr(&self, name: AttrName) -> Option<Attr> {
        match name {
            AttrName::Site => Some(Attr::Site(self.site)),
            AttrName::Permissions => Some(Attr::Permissions(self.perms.clone())),
            AttrName::Accounts => Some(Attr::Accounts(self.accounts.clone())),
            AttrName::CurrentAccount => self.current_account.map(Attr::CurrentAccount),
            AttrName::CurrentNetwork => Some(Attr::CurrentNetwork(self.current_network)),
            _ => None,
        }
    }

    fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        match attr {
            Attr::Permissions(v) => self.perms = v,
            Attr::Accounts(v) => self.accounts = v,
            Attr::CurrentAccount(v) => self.current_account = Some(v),
            Attr::CurrentNetwork(v) => self.current_network = v,
            other => return Err(other),
        }
        Ok(())
    }

    fn retract(&mut self, name: AttrName) -> bool {
        match name {
            AttrName::CurrentAccount => {
                self.current_account = None;
                true
            }
            _ => false,
        }
    }
}

impl Attributes for AuthReq {
    fn references(&self) -> Vec<Eid> {
        let mut refs = vec![self.site];
        if let Some(AuthOutcome::Approved { app: Some(app) }) = &self.outcome {
            refs.push(*app);
        }
        refs
    }

    fn attr(&self, name: AttrName) -> Option<Attr> {
        match name {
            AttrName::Site => Some(Attr::Site(self.site)),
            AttrName::Method => Some(Attr::Method(self.request.method.clone())),
            AttrName::Outcome => self.outcome.clone().map(Attr::Outcome),
            AttrName::App => match &self.outcome {
                Some(AuthOutcome::Approved { app: Some(app) }) => Some(Attr::App(*app)),
                _ => None,
            },
            _ => None,
        }
    }

    fn set(&mut self, attr: Attr) -> Result<(), Attr> {
        match attr {
            Attr::Outcome(v) => self.outcome = Some(v),
            other => return Err(other),
        }
        Ok(())
    }

    fn retract(&mut self, _name: AttrName) -> bool {
        false
    }
}
