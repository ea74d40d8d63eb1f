//! Typed attribute values.
//!
//! An [`Attr`] is one named, typed value on an entity. Transactions set and
//! retract attributes; queries match on them. Reference attributes
//! (`Vault`, `Group`, `Account`, `Network`, `Site`, `HdPath`, `App`) are
//! readable and queryable but fixed at creation, except `CurrentAccount`,
//! `CurrentNetwork` and `Accounts` on an App.

use serde::{Deserialize, Serialize};
use shared_types::{ChainFamily, Eid, Permission, Ticker, VaultKind};
use std::collections::BTreeSet;

use super::entities::AuthOutcome;

/// Attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrName {
    Name,
    Value,
    Nickname,
    Hidden,
    Selected,
    Builtin,
    Family,
    ChainId,
    NetId,
    Endpoint,
    Ticker,
    Kind,
    Fingerprint,
    Index,
    Hex,
    Base32,
    PrivateKey,
    Origin,
    Icon,
    Permissions,
    Accounts,
    CurrentAccount,
    CurrentNetwork,
    Outcome,
    Method,
    // references
    HdPath,
    Vault,
    Group,
    Account,
    Network,
    Site,
    App,
}

/// Attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attr {
    Name(String),
    Value(String),
    Nickname(String),
    Hidden(bool),
    Selected(bool),
    Builtin(bool),
    Family(ChainFamily),
    ChainId(String),
    NetId(u64),
    Endpoint(String),
    Ticker(Ticker),
    Kind(VaultKind),
    Fingerprint(String),
    Index(u32),
    Hex(String),
    Base32(String),
    PrivateKey(String),
    Origin(String),
    Icon(String),
    Permissions(BTreeSet<Permission>),
    Accounts(Vec<Eid>),
    CurrentAccount(Eid),
    CurrentNetwork(Eid),
    Outcome(AuthOutcome),
    Method(String),
    HdPath(Eid),
    Vault(Eid),
    Group(Eid),
    Account(Eid),
    Network(Eid),
    Site(Eid),
    App(Eid),
}

impl Attr {
    /// Name of this attribute.
    #[must_use]
    pub fn name(&self) -> AttrName {
        match self {
            Self::Name(_) => AttrName::Name,
            Self::Value(_) => AttrName::Value,
            Self::Nickname(_) => AttrName::Nickname,
            Self::Hidden(_) => AttrName::Hidden,
            Self::Selected(_) => AttrName::Selected,
            Self::Builtin(_) => AttrName::Builtin,
            Self::Family(_) => AttrName::Family,
            Self::ChainId(_) => AttrName::ChainId,
            Self::NetId(_) => AttrName::NetId,
            Self::Endpoint(_) => AttrName::Endpoint,
            Self::Ticker(_) => AttrName::Ticker,
            Self::Kind(_) => AttrName::Kind,
            Self::Fingerprint(_) => AttrName::Fingerprint,
            Self::Index(_) => AttrName::Index,
            Self::Hex(_) => AttrName::Hex,
            Self::Base32(_) => AttrName::Base32,
            Self::PrivateKey(_) => AttrName::PrivateKey,
            Self::Origin(_) => AttrName::Origin,
            Self::Icon(_) => AttrName::Icon,
            Self::Permissions(_) => AttrName::Permissions,
            Self::Accounts(_) => AttrName::Accounts,
            Self::CurrentAccount(_) => AttrName::CurrentAccount,
            Self::CurrentNetwork(_) => AttrName::CurrentNetwork,
            Self::Outcome(_) => AttrName::Outcome,
            Self::Method(_) => AttrName::Method,
            Self::HdPath(_) => AttrName::HdPath,
            Self::Vault(_) => AttrName::Vault,
            Self::Group(_) => AttrName::Group,
            Self::Account(_) => AttrName::Account,
            Self::Network(_) => AttrName::Network,
            Self::Site(_) => AttrName::Site,
            Self::App(_) => AttrName::App,
        }
    }
}

/// Attribute access implemented by every entity kind.
pub trait Attributes {
    /// Eids this entity points at. All must exist at commit time.
    fn references(&self) -> Vec<Eid>;

    /// Current value of an attribute, if the entity has it and it is present.
    fn attr(&self, name: AttrName) -> Option<Attr>;

    /// Set a mutable attribute. Returns the attribute back if this entity
    /// kind does not accept it.
    fn set(&mut self, attr: Attr) -> Result<(), Attr>;

    /// Remove an optional attribute. Returns false if the attribute is not
    /// retractable on this kind.
    fn retract(&mut self, name: AttrName) -> bool;
}
