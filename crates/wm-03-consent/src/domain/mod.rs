//! Consent domain: the parked-continuation table and its error type.

pub mod errors;
pub mod pending;
pub mod view;

pub use errors::{ConsentError, ConsentResult};
pub use pending::{PendingConsents, PendingStats, Settlement};
pub use view::{PendingAuthReq, PendingCall};
