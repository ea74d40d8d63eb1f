//! Outbound ports of the entity store.

use crate::domain::TxReport;

/// Receives a notification after every committed, non-empty transaction.
///
/// Called synchronously after the write lock is released.
pub trait ChangeNotifier: Send + Sync {
    fn entities_changed(&self, report: &TxReport);
}
