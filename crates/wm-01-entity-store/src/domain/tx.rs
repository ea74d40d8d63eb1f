//! Transactions.
//!
//! A [`Tx`] applies operations directly to the write-locked tables and keeps
//! an undo log of the first prior value of every touched eid. Commit checks
//! referential integrity; any failure, or dropping the `Tx` uncommitted,
//! restores the undo log. Readers hold the same lock, so they never observe
//! a half-applied batch.

use super::attrs::{Attr, AttrName};
use super::errors::StoreError;
use super::tables::{Entity, Record, Tables};
use serde::{Deserialize, Serialize};
use shared_types::Eid;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// One operation of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TxOp {
    /// Insert a new entity under a reserved eid.
    Create(Eid, Entity),
    /// Set one attribute.
    Set(Eid, Attr),
    /// Remove one optional attribute, keeping the entity.
    Retract(Eid, AttrName),
    /// Remove the entity.
    Delete(Eid),
}

/// What a committed transaction changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxReport {
    pub created: Vec<Eid>,
    pub updated: Vec<Eid>,
    pub deleted: Vec<Eid>,
}

impl TxReport {
    /// Every eid the transaction touched.
    #[must_use]
    pub fn eids(&self) -> Vec<Eid> {
        let mut all: Vec<Eid> = self
            .created
            .iter()
            .chain(&self.updated)
            .chain(&self.deleted)
            .copied()
            .collect();
        all.sort_unstable();
        all
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// An open transaction. Obtained from `EntityStore::transact_with`.
pub struct Tx<'a> {
    tables: &'a mut Tables,
    ids: &'a AtomicU64,
    undo: Vec<(Eid, Option<Entity>)>,
    touched: BTreeSet<Eid>,
    committed: bool,
}

impl<'a> Tx<'a> {
    pub(crate) fn new(tables: &'a mut Tables, ids: &'a AtomicU64) -> Self {
        Self {
            tables,
            ids,
            undo: Vec::new(),
            touched: BTreeSet::new(),
            committed: false,
        }
    }

    /// Current state, including operations already applied in this transaction.
    #[must_use]
    pub fn view(&self) -> &Tables {
        self.tables
    }

    /// Typed lookup against the in-progress state.
    #[must_use]
    pub fn get<T: Record>(&self, eid: Eid) -> Option<&T> {
        self.tables.get::<T>(eid)
    }

    /// Typed lookup that fails with `NotFound`/`WrongKind`.
    pub fn require<T: Record>(&self, eid: Eid) -> Result<&T, StoreError> {
        match self.tables.get::<T>(eid) {
            Some(e) => Ok(e),
            None => Err(match self.tables.kind(eid) {
                Some(actual) => StoreError::WrongKind {
                    eid,
                    expected: T::KIND,
                    actual,
                },
                None => StoreError::NotFound(eid),
            }),
        }
    }

    /// Allocate a fresh eid without creating anything.
    pub fn reserve(&self) -> Eid {
        Eid(self.ids.fetch_add(1, Ordering::Relaxed))
    }

    /// Reserve an eid and create `entity` under it.
    pub fn create(&mut self, entity: impl Into<Entity>) -> Result<Eid, StoreError> {
        let eid = self.reserve();
        self.apply(TxOp::Create(eid, entity.into()))?;
        Ok(eid)
    }

    pub fn set(&mut self, eid: Eid, attr: Attr) -> Result<(), StoreError> {
        self.apply(TxOp::Set(eid, attr))
    }

    pub fn retract(&mut self, eid: Eid, name: AttrName) -> Result<(), StoreError> {
        self.apply(TxOp::Retract(eid, name))
    }

    pub fn delete(&mut self, eid: Eid) -> Result<(), StoreError> {
        self.apply(TxOp::Delete(eid))
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: TxOp) -> Result<(), StoreError> {
        match op {
            TxOp::Create(eid, entity) => {
                if self.tables.contains(eid) {
                    return Err(StoreError::AlreadyExists(eid));
                }
                self.record_undo(eid);
                self.tables.insert(eid, entity);
            }
            TxOp::Set(eid, attr) => {
                let mut entity = self.tables.entity(eid).ok_or(StoreError::NotFound(eid))?;
                let name = attr.name();
                entity
                    .set(attr)
                    .map_err(|_| StoreError::UnsupportedAttribute {
                        eid,
                        kind: entity.kind(),
                        attr: name,
                    })?;
                self.record_undo(eid);
                self.tables.insert(eid, entity);
            }
            TxOp::Retract(eid, name) => {
                let mut entity = self.tables.entity(eid).ok_or(StoreError::NotFound(eid))?;
                if !entity.retract(name) {
                    return Err(StoreError::UnsupportedAttribute {
                        eid,
                        kind: entity.kind(),
                        attr: name,
                    });
                }
                self.record_undo(eid);
                self.tables.insert(eid, entity);
            }
            TxOp::Delete(eid) => {
                if !self.tables.contains(eid) {
                    return Err(StoreError::NotFound(eid));
                }
                self.record_undo(eid);
                self.tables.remove(eid);
            }
        }
        Ok(())
    }

    fn record_undo(&mut self, eid: Eid) {
        if self.touched.insert(eid) {
            self.undo.push((eid, self.tables.entity(eid)));
        }
    }

    /// Verify integrity and make the changes permanent.
    pub(crate) fn commit(mut self) -> Result<TxReport, StoreError> {
        self.check_integrity()?;

        let mut report = TxReport::default();
        for (eid, before) in &self.undo {
            match (before.is_some(), self.tables.contains(*eid)) {
                (false, true) => report.created.push(*eid),
                (true, true) => report.updated.push(*eid),
                (true, false) => report.deleted.push(*eid),
                (false, false) => {}
            }
        }
        self.committed = true;
        Ok(report)
    }

    fn check_integrity(&self) -> Result<(), StoreError> {
        let mut gone = Vec::new();
        for eid in &self.touched {
            match self.tables.entity(*eid) {
                Some(entity) => {
                    if let Some(missing) = entity
                        .references()
                        .into_iter()
                        .find(|r| !self.tables.contains(*r))
                    {
                        return Err(StoreError::NotFound(missing));
                    }
                }
                None => gone.push(*eid),
            }
        }
        if gone.is_empty() {
            return Ok(());
        }
        match self.tables.find_dangling(&gone) {
            Some((from, to)) => Err(StoreError::DanglingReference { from, to }),
            None => Ok(()),
        }
    }

    fn rollback(&mut self) {
        while let Some((eid, before)) = self.undo.pop() {
            self.tables.remove(eid);
            if let Some(entity) = before {
                self.tables.insert(eid, entity);
            }
        }
    }
}

impl Drop for Tx<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}
