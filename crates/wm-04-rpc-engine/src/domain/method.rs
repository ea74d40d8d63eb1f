//! Method declarations.
//!
//! Every registered method carries a [`MethodSpec`]: who may call it, whether
//! it works while locked, which other methods and store accessors it may use,
//! its caching policy, whether it needs user consent, and its params schema.

use super::schema::ParamSchema;
use serde_json::Value;
use std::time::Duration;

/// External caller kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caller {
    /// Script running in a dapp page.
    Inpage,
    /// The wallet popup.
    Popup,
}

impl Caller {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inpage => "inpage",
            Self::Popup => "popup",
        }
    }
}

/// Wallet store accessors a handler may be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Access {
    /// Queries.
    Read,
    /// Mutations (implies queries).
    Write,
    /// Private keys and signing.
    Keys,
}

/// How cache entries are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    Method,
    /// Method name scoped to the resolved network.
    MethodAndNetwork,
}

/// Time-to-live caching of a method's successful results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub key: CacheKey,
}

impl CachePolicy {
    /// TTL cache keyed by method name per network.
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            key: CacheKey::MethodAndNetwork,
        }
    }

    #[must_use]
    pub fn key_for(&self, method: &str, network: &str) -> String {
        match self.key {
            CacheKey::Method => method.to_string(),
            CacheKey::MethodAndNetwork => format!("{network}/{method}"),
        }
    }
}

/// Declaration of one method.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub name: &'static str,
    /// External callers allowed. Empty means internal only.
    pub external: Vec<Caller>,
    /// Callable while the wallet is locked.
    pub locked: bool,
    /// Methods this one may call.
    pub methods: Vec<&'static str>,
    /// Store accessors this one may use.
    pub db: Vec<Access>,
    pub cache: Option<CachePolicy>,
    /// Page calls are parked until the user decides.
    pub consent: bool,
    /// Page calls need the site to already hold an App.
    pub requires_app: bool,
    pub schema: Option<ParamSchema>,
    /// Rewrites valid params into canonical form before execution.
    pub normalize: Option<fn(&mut Value)>,
}

impl MethodSpec {
    /// Internal-only method with no capabilities.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            external: Vec::new(),
            locked: false,
            methods: Vec::new(),
            db: Vec::new(),
            cache: None,
            consent: false,
            requires_app: false,
            schema: None,
            normalize: None,
        }
    }

    #[must_use]
    pub fn inpage(mut self) -> Self {
        self.allow(Caller::Inpage);
        self
    }

    #[must_use]
    pub fn popup(mut self) -> Self {
        self.allow(Caller::Popup);
        self
    }

    #[must_use]
    pub fn allow_locked(mut self) -> Self {
        self.locked = true;
        self
    }

    #[must_use]
    pub fn calls(mut self, methods: &[&'static str]) -> Self {
        self.methods.extend_from_slice(methods);
        self
    }

    #[must_use]
    pub fn db(mut self, access: &[Access]) -> Self {
        self.db.extend_from_slice(access);
        self
    }

    #[must_use]
    pub fn cache(mut self, policy: CachePolicy) -> Self {
        self.cache = Some(policy);
        self
    }

    #[must_use]
    pub fn consent(mut self) -> Self {
        self.consent = true;
        self
    }

    #[must_use]
    pub fn requires_app(mut self) -> Self {
        self.requires_app = true;
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: ParamSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn normalize(mut self, normalize: fn(&mut Value)) -> Self {
        self.normalize = Some(normalize);
        self
    }

    fn allow(&mut self, caller: Caller) {
        if !self.external.contains(&caller) {
            self.external.push(caller);
        }
    }

    #[must_use]
    pub fn is_internal_only(&self) -> bool {
        self.external.is_empty()
    }

    #[must_use]
    pub fn allows(&self, caller: Caller) -> bool {
        self.external.contains(&caller)
    }

    #[must_use]
    pub fn may_call(&self, method: &str) -> bool {
        self.methods.contains(&method)
    }

    /// Whether `access` was declared. `Write` covers `Read`.
    #[must_use]
    pub fn grants(&self, access: Access) -> bool {
        self.db.contains(&access) || (access == Access::Read && self.db.contains(&Access::Write))
    }

    #[must_use]
    pub fn block_ref_position(&self) -> Option<usize> {
        self.schema.as_ref().and_then(ParamSchema::block_ref_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let spec = MethodSpec::new("cfx_requestAccounts")
            .inpage()
            .inpage()
            .allow_locked()
            .calls(&["wallet_requestPermissions"])
            .db(&[Access::Read]);

        assert_eq!(spec.external, vec![Caller::Inpage]);
        assert!(spec.allows(Caller::Inpage));
        assert!(!spec.allows(Caller::Popup));
        assert!(spec.locked);
        assert!(spec.may_call("wallet_requestPermissions"));
        assert!(!spec.may_call("wallet_deleteApp"));
    }

    #[test]
    fn test_internal_only_by_default() {
        let spec = MethodSpec::new("wallet_getAddressPrivateKey");
        assert!(spec.is_internal_only());
        assert!(!spec.locked);
        assert!(!spec.consent);
    }

    #[test]
    fn test_write_grants_read() {
        let spec = MethodSpec::new("m").db(&[Access::Write]);
        assert!(spec.grants(Access::Read));
        assert!(spec.grants(Access::Write));
        assert!(!spec.grants(Access::Keys));
    }

    #[test]
    fn test_cache_keys() {
        let policy = CachePolicy::ttl(Duration::from_secs(60));
        assert_eq!(policy.key_for("cfx_chainId", "CFX_MAINNET"), "CFX_MAINNET/cfx_chainId");

        let policy = CachePolicy {
            key: CacheKey::Method,
            ..policy
        };
        assert_eq!(policy.key_for("cfx_chainId", "CFX_MAINNET"), "cfx_chainId");
    }
}
