//! # Core Identifiers and Vocabularies
//!
//! The entity structs themselves live in the entity store; this module only
//! holds the pieces every crate needs to name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-unique entity identifier.
///
/// Eids are allocated by the entity store and never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Eid(pub u64);

impl Eid {
    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Eid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Chain family of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    /// Conflux core space.
    Cfx,
    /// Ethereum and EVM compatible chains.
    Eth,
}

impl ChainFamily {
    /// Family implied by an RPC method name prefix.
    ///
    /// `cfx*` routes to [`ChainFamily::Cfx`]; `eth*`, `net*` and `web3*` route
    /// to [`ChainFamily::Eth`]. Everything else (`wallet_*`, `personal_*`) is
    /// family-agnostic.
    #[must_use]
    pub fn from_method(method: &str) -> Option<Self> {
        if method.starts_with("cfx") {
            Some(Self::Cfx)
        } else if method.starts_with("eth")
            || method.starts_with("net")
            || method.starts_with("web3")
        {
            Some(Self::Eth)
        } else {
            None
        }
    }

    /// Block/epoch reference injected when a caller omits it.
    #[must_use]
    pub fn default_block_ref(self) -> &'static str {
        match self {
            Self::Cfx => "latest_state",
            Self::Eth => "latest",
        }
    }

    /// Lowercase family tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cfx => "cfx",
            Self::Eth => "eth",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of credential a vault holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultKind {
    /// Mnemonic, many accounts derivable.
    Hd,
    /// Single raw private key.
    Pk,
    /// Watch-only public address. No secret material.
    Pub,
}

impl VaultKind {
    /// Whether the vault carries encrypted secret material.
    #[must_use]
    pub fn has_secret(self) -> bool {
        !matches!(self, Self::Pub)
    }
}

/// Capability names an App may be granted.
///
/// The set is closed: unknown names in a request are rejected by schema
/// validation before reaching the domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Site may talk to the wallet at all.
    WalletBasic,
    /// Site may see its authorized accounts.
    WalletAccounts,
}

impl Permission {
    /// Every grantable permission.
    pub const ALL: [Permission; 2] = [Permission::WalletBasic, Permission::WalletAccounts];

    /// Parse a permission name, accepting the per-family account aliases.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wallet_basic" => Some(Self::WalletBasic),
            "wallet_accounts" | "cfx_accounts" | "eth_accounts" => Some(Self::WalletAccounts),
            _ => None,
        }
    }

    /// Canonical wire name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::WalletBasic => "wallet_basic",
            Self::WalletAccounts => "wallet_accounts",
        }
    }
}

/// Native currency descriptor of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Ticker {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}
