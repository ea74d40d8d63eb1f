//! Adapters for the entity store ports.

pub mod bus_notifier;

pub use bus_notifier::BusNotifier;
