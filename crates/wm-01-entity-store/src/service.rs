//! The entity store service.

use crate::domain::{
    Attr, AttrName, Entity, Record, StoreError, Tables, Tx, TxOp, TxReport,
};
use crate::ports::ChangeNotifier;
use parking_lot::RwLock;
use shared_types::Eid;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Transaction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub committed: u64,
    pub aborted: u64,
    pub entities: usize,
}

/// Transactional store of typed entities.
///
/// All mutation goes through [`EntityStore::transact_with`] (or the
/// [`EntityStore::transact`] shorthand), which holds the write lock for the
/// whole batch.
pub struct EntityStore {
    tables: RwLock<Tables>,
    next_eid: AtomicU64,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    committed: AtomicU64,
    aborted: AtomicU64,
}

impl EntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_eid: AtomicU64::new(1),
            notifier: None,
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    /// Store that reports every commit to `notifier`.
    #[must_use]
    pub fn with_notifier(notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self {
            notifier: Some(notifier),
            ..Self::new()
        }
    }

    /// Allocate an eid.
    pub fn reserve(&self) -> Eid {
        Eid(self.next_eid.fetch_add(1, Ordering::Relaxed))
    }

    /// Run `plan` inside one transaction.
    ///
    /// `plan` sees its own writes through [`Tx::view`]. If it returns `Err`,
    /// or commit fails its integrity check, nothing is applied.
    pub fn transact_with<R, E, F>(&self, plan: F) -> Result<R, E>
    where
        F: FnOnce(&mut Tx<'_>) -> Result<R, E>,
        E: From<StoreError>,
    {
        self.run(plan).map(|(value, _)| value)
    }

    /// Apply a batch of operations atomically.
    pub fn transact(&self, ops: Vec<TxOp>) -> Result<TxReport, StoreError> {
        self.run(|tx| ops.into_iter().try_for_each(|op| tx.apply(op)))
            .map(|((), report)| report)
    }

    fn run<R, E, F>(&self, plan: F) -> Result<(R, TxReport), E>
    where
        F: FnOnce(&mut Tx<'_>) -> Result<R, E>,
        E: From<StoreError>,
    {
        let (value, report) = {
            let mut tables = self.tables.write();
            let mut tx = Tx::new(&mut tables, &self.next_eid);
            let value = match plan(&mut tx) {
                Ok(value) => value,
                Err(err) => {
                    drop(tx);
                    self.aborted.fetch_add(1, Ordering::Relaxed);
                    return Err(err);
                }
            };
            match tx.commit() {
                Ok(report) => (value, report),
                Err(err) => {
                    self.aborted.fetch_add(1, Ordering::Relaxed);
                    debug!(error = %err, "Transaction aborted at commit");
                    return Err(err.into());
                }
            }
        };

        self.committed.fetch_add(1, Ordering::Relaxed);
        if !report.is_empty() {
            trace!(
                created = report.created.len(),
                updated = report.updated.len(),
                deleted = report.deleted.len(),
                "Transaction committed"
            );
            if let Some(notifier) = &self.notifier {
                notifier.entities_changed(&report);
            }
        }
        Ok((value, report))
    }

    /// Create one entity in its own transaction.
    pub fn create_entity(&self, entity: impl Into<Entity>) -> Result<Eid, StoreError> {
        let entity = entity.into();
        self.transact_with(|tx| tx.create(entity))
    }

    /// Remove one optional attribute value, keeping the entity.
    pub fn retract_attribute(&self, eid: Eid, name: AttrName) -> Result<(), StoreError> {
        self.transact_with(|tx| tx.retract(eid, name))
    }

    /// Eids whose attribute equals `value`.
    #[must_use]
    pub fn query(&self, value: &Attr) -> Vec<Eid> {
        self.tables.read().query(value)
    }

    /// Eids of `T` rows that reference `target`.
    #[must_use]
    pub fn referrers<T: Record>(&self, target: Eid) -> Vec<Eid> {
        self.tables.read().referrers::<T>(target)
    }

    #[must_use]
    pub fn get<T: Record>(&self, eid: Eid) -> Option<T> {
        self.tables.read().get::<T>(eid).cloned()
    }

    #[must_use]
    pub fn all<T: Record>(&self) -> Vec<(Eid, T)> {
        self.tables
            .read()
            .all::<T>()
            .map(|(eid, e)| (eid, e.clone()))
            .collect()
    }

    #[must_use]
    pub fn find<T: Record, F>(&self, pred: F) -> Vec<(Eid, T)>
    where
        F: Fn(&T) -> bool,
    {
        self.tables
            .read()
            .all::<T>()
            .filter(|(_, e)| pred(e))
            .map(|(eid, e)| (eid, e.clone()))
            .collect()
    }

    #[must_use]
    pub fn count<T: Record>(&self) -> usize {
        self.tables.read().count::<T>()
    }

    /// Run a read-only closure against a consistent snapshot.
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.tables.read())
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            committed: self.committed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            entities: self.tables.read().len(),
        }
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
