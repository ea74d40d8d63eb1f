//! Publishes committed transactions to the shared event bus.

use crate::domain::TxReport;
use crate::ports::ChangeNotifier;
use shared_bus::{InMemoryEventBus, WalletEvent};
use std::sync::Arc;

/// [`ChangeNotifier`] emitting `WalletEvent::EntitiesChanged`.
pub struct BusNotifier {
    bus: Arc<InMemoryEventBus>,
}

impl BusNotifier {
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }
}

impl ChangeNotifier for BusNotifier {
    fn entities_changed(&self, report: &TxReport) {
        self.bus.emit(WalletEvent::EntitiesChanged {
            eids: report.eids(),
        });
    }
}
