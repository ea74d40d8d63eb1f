//! Entity store error types.

use super::attrs::AttrName;
use super::tables::EntityKind;
use shared_types::{Eid, RpcError};
use thiserror::Error;

/// Errors that abort a transaction.
///
/// Any error leaves the store exactly as it was before the transaction began.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An operation or a reference named an eid that does not exist.
    #[error("Entity not found: {0}")]
    NotFound(Eid),

    /// An entity exists but is not of the expected kind.
    #[error("Entity {eid} is a {actual:?}, expected {expected:?}")]
    WrongKind {
        eid: Eid,
        expected: EntityKind,
        actual: EntityKind,
    },

    /// `Create` for an eid already in use.
    #[error("Entity already exists: {0}")]
    AlreadyExists(Eid),

    /// The attribute cannot be set or retracted on this kind.
    #[error("Attribute {attr:?} not supported on {kind:?} {eid}")]
    UnsupportedAttribute {
        eid: Eid,
        kind: EntityKind,
        attr: AttrName,
    },

    /// A delete would leave `from` pointing at the removed `to`.
    #[error("Entity {from} still references deleted entity {to}")]
    DanglingReference { from: Eid, to: Eid },
}

impl From<StoreError> for RpcError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(eid) => {
                RpcError::invalid_params(format!("Invalid id {eid}, entity not found"))
            }
            StoreError::WrongKind { eid, expected, .. } => {
                RpcError::invalid_params(format!("Invalid id {eid}, expected {expected:?}"))
            }
            other => RpcError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ErrorKind;

    #[test]
    fn test_not_found_maps_to_invalid_params() {
        let err: RpcError = StoreError::NotFound(Eid(42)).into();
        assert_eq!(err.kind, ErrorKind::InvalidParams);
        assert!(err.message.contains("42"));
    }

    #[test]
    fn test_integrity_errors_are_internal() {
        let err: RpcError = StoreError::DanglingReference {
            from: Eid(1),
            to: Eid(2),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Internal);
    }
}
