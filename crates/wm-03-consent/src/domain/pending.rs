//! Parked continuation table.
//!
//! Maps AuthReq ids to callers suspended until the user decides. This is the
//! only state shared between concurrently running requests.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use shared_types::{Eid, RpcError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What a parked caller eventually receives.
pub type Settlement = Result<Value, RpcError>;

/// A caller waiting for a decision.
struct Parked {
    sender: oneshot::Sender<Settlement>,
    created_at: Instant,
    method: String,
}

/// Counters for the parked table.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Calls parked since start.
    pub total_parked: AtomicU64,
    /// Calls that received a decision.
    pub total_settled: AtomicU64,
    /// Calls cancelled, or whose caller went away before the decision.
    pub total_cancelled: AtomicU64,
}

/// Parked callers keyed by AuthReq id.
///
/// Flow:
/// 1. The consent layer records an AuthReq and calls `park()` for a receiver
/// 2. The caller awaits the receiver; other requests keep running
/// 3. A popup resolution calls `settle()` with the handler's outcome
/// 4. The caller resumes with that outcome
///
/// There is no expiry: a parked call waits until it is settled or cancelled.
///
/// A resolution claims its id before running the resolving handler, so a
/// second approval of the same id fails instead of running it twice.
#[derive(Default)]
pub struct PendingConsents {
    parked: DashMap<Eid, Parked>,
    resolving: DashMap<Eid, Instant>,
    stats: Arc<PendingStats>,
}

impl PendingConsents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a caller under `auth_req` and get the receiver it should await.
    pub fn park(&self, auth_req: Eid, method: &str) -> oneshot::Receiver<Settlement> {
        let (tx, rx) = oneshot::channel();
        self.parked.insert(
            auth_req,
            Parked {
                sender: tx,
                created_at: Instant::now(),
                method: method.to_string(),
            },
        );
        self.stats.total_parked.fetch_add(1, Ordering::Relaxed);

        debug!(auth_req = %auth_req, method = method, "Parked call awaiting consent");
        rx
    }

    /// Resume the caller parked under `auth_req`.
    ///
    /// Returns false if nothing is parked there or the caller is gone.
    pub fn settle(&self, auth_req: Eid, settlement: Settlement) -> bool {
        let Some((_, parked)) = self.parked.remove(&auth_req) else {
            warn!(auth_req = %auth_req, "Settlement for unknown auth request");
            return false;
        };
        let waited = parked.created_at.elapsed();

        match parked.sender.send(settlement) {
            Ok(()) => {
                self.stats.total_settled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    auth_req = %auth_req,
                    method = parked.method,
                    waited_ms = waited.as_millis(),
                    "Resumed parked call"
                );
                true
            }
            Err(_) => {
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    auth_req = %auth_req,
                    method = parked.method,
                    "Parked caller already gone"
                );
                false
            }
        }
    }

    /// Drop the caller parked under `auth_req` without a decision.
    pub fn cancel(&self, auth_req: Eid) -> bool {
        if self.parked.remove(&auth_req).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Mark `auth_req` as being resolved. False if another resolution holds it.
    pub fn claim(&self, auth_req: Eid) -> bool {
        match self.resolving.entry(auth_req) {
            Entry::Occupied(_) => {
                debug!(auth_req = %auth_req, "Auth request already being resolved");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                true
            }
        }
    }

    /// Drop the resolution claim on `auth_req`.
    pub fn release(&self, auth_req: Eid) {
        self.resolving.remove(&auth_req);
    }

    pub fn is_resolving(&self, auth_req: Eid) -> bool {
        self.resolving.contains_key(&auth_req)
    }

    pub fn is_parked(&self, auth_req: Eid) -> bool {
        self.parked.contains_key(&auth_req)
    }

    pub fn pending_count(&self) -> usize {
        self.parked.len()
    }

    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_park_and_settle() {
        let table = PendingConsents::new();

        let rx = table.park(Eid(1), "wallet_requestPermissions");
        assert!(table.is_parked(Eid(1)));
        assert_eq!(table.pending_count(), 1);

        assert!(table.settle(Eid(1), Ok(json!(["0xabc"]))));
        assert_eq!(rx.await.unwrap().unwrap(), json!(["0xabc"]));
        assert_eq!(table.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_settle_with_rejection() {
        let table = PendingConsents::new();
        let rx = table.park(Eid(2), "personal_sign");

        table.settle(Eid(2), Err(RpcError::user_rejected()));
        let err = rx.await.unwrap().unwrap_err();
        assert!(err.is_user_rejected());
    }

    #[test]
    fn test_settle_unknown_id() {
        let table = PendingConsents::new();
        assert!(!table.settle(Eid(7), Ok(Value::Null)));
    }

    #[test]
    fn test_settle_after_caller_left() {
        let table = PendingConsents::new();
        drop(table.park(Eid(3), "personal_sign"));

        assert!(!table.settle(Eid(3), Ok(Value::Null)));
        assert_eq!(table.stats().total_cancelled.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_cancel() {
        let table = PendingConsents::new();
        let _rx = table.park(Eid(4), "personal_sign");

        assert!(table.cancel(Eid(4)));
        assert!(!table.is_parked(Eid(4)));
        assert!(!table.cancel(Eid(4)));
    }

    #[test]
    fn test_claim_is_exclusive_until_released() {
        let table = PendingConsents::new();
        let _rx = table.park(Eid(5), "wallet_addEthereumChain");

        assert!(table.claim(Eid(5)));
        assert!(!table.claim(Eid(5)));
        assert!(table.is_resolving(Eid(5)));

        table.release(Eid(5));
        assert!(!table.is_resolving(Eid(5)));
        assert!(table.claim(Eid(5)));
    }

    #[test]
    fn test_independent_ids() {
        let table = PendingConsents::new();
        let _a = table.park(Eid(10), "personal_sign");
        let _b = table.park(Eid(11), "personal_sign");

        table.settle(Eid(11), Ok(Value::Null));
        assert!(table.is_parked(Eid(10)));
        assert!(!table.is_parked(Eid(11)));
        assert_eq!(table.stats().total_parked.load(Ordering::Relaxed), 2);
        assert_eq!(table.stats().total_settled.load(Ordering::Relaxed), 1);
    }
}
