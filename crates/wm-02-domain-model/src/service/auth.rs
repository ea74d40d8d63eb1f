//! Consent request records.

use super::*;
use shared_types::RpcRequest;
use wm_01_entity_store::AuthOutcome;

impl WalletDb {
    /// Record a parked request from `site`.
    pub fn create_auth_req(&self, site: Eid, request: RpcRequest) -> DomainResult<Eid> {
        let method = request.method.clone();
        let eid = self.store.create_entity(AuthReq {
            site,
            request,
            outcome: None,
        })?;
        debug!(auth_req = %eid, method = %method, "Auth request recorded");
        Ok(eid)
    }

    /// Every unresolved consent request, oldest first.
    #[must_use]
    pub fn pending_auth_reqs(&self) -> Vec<(Eid, AuthReq)> {
        self.store.find::<AuthReq, _>(|r| r.outcome.is_none())
    }

    /// Resolve a consent request and remove it.
    ///
    /// Returns the record with its outcome filled in.
    pub fn finish_auth_req(&self, auth_req: Eid, outcome: AuthOutcome) -> DomainResult<AuthReq> {
        self.store.transact_with(|tx| {
            let mut row = tx.require::<AuthReq>(auth_req)?.clone();
            tx.delete(auth_req)?;
            row.outcome = Some(outcome);
            Ok(row)
        })
    }

    /// Remove a consent request without recording an outcome.
    pub fn delete_auth_req(&self, auth_req: Eid) -> DomainResult<()> {
        self.store.transact_with(|tx| {
            tx.require::<AuthReq>(auth_req)?;
            tx.delete(auth_req)?;
            Ok(())
        })
    }
}
