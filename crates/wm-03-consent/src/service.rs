//! # Consent Protocol Service
//!
//! Lifecycle of a consent-gated call:
//!
//! ```text
//! received ──park()──▶ pending-consent ──settle(Ok)──▶ approved
//!                            │
//!                            └──settle(Err)/reject()──▶ rejected
//! ```
//!
//! `park()` records an AuthReq for the caller's site, registers the parked
//! continuation and suspends. Resolution runs in a different request (the
//! popup), which settles the continuation with the handler's outcome and
//! deletes the AuthReq. Each id resolves independently.

use crate::domain::{
    ConsentError, ConsentResult, PendingAuthReq, PendingCall, PendingConsents, Settlement,
};
use serde_json::Value;
use shared_bus::{InMemoryEventBus, WalletEvent};
use shared_types::{Eid, RpcError, RpcRequest};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument};
use wm_01_entity_store::{AuthOutcome, AuthReq, Site};
use wm_02_domain_model::WalletDb;

/// Suspends consent-gated calls and resumes them on a popup decision.
pub struct ConsentProtocol {
    db: Arc<WalletDb>,
    pending: PendingConsents,
    bus: Option<Arc<InMemoryEventBus>>,
}

impl ConsentProtocol {
    pub fn new(db: Arc<WalletDb>) -> Self {
        Self {
            db,
            pending: PendingConsents::new(),
            bus: None,
        }
    }

    /// Publish `AuthRequested`/`AuthResolved` on `bus`.
    #[must_use]
    pub fn with_bus(mut self, bus: Arc<InMemoryEventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn parked(&self) -> &PendingConsents {
        &self.pending
    }

    // =========================================================================
    // SUSPENSION
    // =========================================================================

    /// Park `request` until the user decides, then return the decision.
    ///
    /// Dropping the returned future before a decision abandons the AuthReq.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn park(&self, request: &RpcRequest) -> Result<Value, RpcError> {
        let (auth_req, rx) = self.open(request)?;
        let mut guard = AbandonOnDrop {
            consent: self,
            auth_req,
            armed: true,
        };
        let received = rx.await;
        guard.armed = false;

        match received {
            Ok(settlement) => settlement,
            Err(_) => Err(ConsentError::Abandoned(auth_req).into()),
        }
    }

    /// Record the AuthReq and register the continuation, with no suspension
    /// point in between.
    fn open(&self, request: &RpcRequest) -> ConsentResult<(Eid, oneshot::Receiver<Settlement>)> {
        let origin = request
            .origin
            .as_deref()
            .ok_or(ConsentError::MissingOrigin)?;
        let (site, _) = self.db.upsert_site(origin, None, None)?;
        let auth_req = self.db.create_auth_req(site, request.clone())?;
        let rx = self.pending.park(auth_req, &request.method);

        info!(auth_req = %auth_req, origin = origin, method = %request.method, "Awaiting user consent");
        self.emit(WalletEvent::AuthRequested {
            auth_req,
            origin: origin.to_string(),
            method: request.method.clone(),
        });
        Ok((auth_req, rx))
    }

    /// Drop the continuation and the AuthReq without a decision.
    pub fn abandon(&self, auth_req: Eid) {
        if self.pending.cancel(auth_req) {
            if let Err(e) = self.db.delete_auth_req(auth_req) {
                debug!(auth_req = %auth_req, error = %e, "Abandoned auth request already gone");
            }
            info!(auth_req = %auth_req, "Parked call abandoned");
        }
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// Pending AuthReq by id.
    pub fn auth_req(&self, auth_req: Eid) -> ConsentResult<AuthReq> {
        self.db
            .get::<AuthReq>(auth_req)
            .filter(|r| r.outcome.is_none())
            .ok_or(ConsentError::UnknownAuthReq(auth_req))
    }

    /// Every pending consent request, oldest first.
    #[must_use]
    pub fn pending_requests(&self) -> Vec<PendingAuthReq> {
        self.db
            .pending_auth_reqs()
            .into_iter()
            .filter_map(|(eid, row)| {
                let site = self.db.get::<Site>(row.site)?;
                Some(PendingAuthReq {
                    auth_req_id: eid,
                    site,
                    app: self.db.app_for_site(row.site).map(|(app, _)| app),
                    req: PendingCall {
                        method: row.request.method,
                        params: row.request.params,
                    },
                })
            })
            .collect()
    }

    /// Claim `auth_req` for a resolution through `method`.
    ///
    /// Fails unless the AuthReq is pending, was parked by a call to `method`
    /// and no other resolution holds it. The claim lasts until [`settle`]
    /// or [`release`].
    ///
    /// [`settle`]: Self::settle
    /// [`release`]: Self::release
    pub fn claim(&self, auth_req: Eid, method: &str) -> ConsentResult<AuthReq> {
        let record = self.auth_req(auth_req)?;
        if record.request.method != method {
            debug!(auth_req = %auth_req, expected = %record.request.method, method, "Resolution method mismatch");
            return Err(ConsentError::MethodMismatch {
                auth_req,
                expected: record.request.method,
                method: method.to_string(),
            });
        }
        if !self.pending.claim(auth_req) {
            return Err(ConsentError::AlreadyResolving(auth_req));
        }
        Ok(record)
    }

    /// Give up a claim without settling.
    pub fn release(&self, auth_req: Eid) {
        self.pending.release(auth_req);
    }

    /// Resolve `auth_req` with a handler outcome and resume its caller.
    ///
    /// The AuthReq is deleted whatever the outcome and any claim on it is
    /// released. Returns the record with the outcome filled in.
    #[instrument(skip(self, settlement))]
    pub fn settle(&self, auth_req: Eid, settlement: Settlement) -> ConsentResult<AuthReq> {
        let result = self.finish(auth_req, settlement);
        self.pending.release(auth_req);
        result
    }

    fn finish(&self, auth_req: Eid, settlement: Settlement) -> ConsentResult<AuthReq> {
        let site = self.auth_req(auth_req)?.site;
        let outcome = match &settlement {
            Ok(_) => AuthOutcome::Approved {
                app: self.db.app_for_site(site).map(|(app, _)| app),
            },
            Err(err) => AuthOutcome::Rejected {
                code: err.code,
                message: err.message.clone(),
            },
        };
        let approved = settlement.is_ok();

        let record = self.db.finish_auth_req(auth_req, outcome)?;
        let resumed = self.pending.settle(auth_req, settlement);

        info!(auth_req = %auth_req, approved, resumed, "Auth request resolved");
        self.emit(WalletEvent::AuthResolved { auth_req, approved });
        Ok(record)
    }

    /// Reject `auth_req`: its caller receives UserRejected.
    ///
    /// Fails while an approval of the same id is running.
    pub fn reject(&self, auth_req: Eid) -> ConsentResult<AuthReq> {
        self.auth_req(auth_req)?;
        if !self.pending.claim(auth_req) {
            return Err(ConsentError::AlreadyResolving(auth_req));
        }
        self.settle(auth_req, Err(RpcError::user_rejected()))
    }

    fn emit(&self, event: WalletEvent) {
        if let Some(bus) = &self.bus {
            bus.emit(event);
        }
    }
}

/// Abandons the AuthReq if the parked future is dropped early.
struct AbandonOnDrop<'a> {
    consent: &'a ConsentProtocol,
    auth_req: Eid,
    armed: bool,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.consent.abandon(self.auth_req);
        }
    }
}
