//! Error types for settlement sessions.

use thiserror::Error;

use super::PhaseKind;
use crate::error::{ReconciliationError, UnbalancedSettlementError, ValidationError};

/// Error returned by [`Session`](super::Session) operations. The session is
/// left exactly as it was whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session is {actual}, operation needs it {expected}")]
    WrongPhase {
        expected: PhaseKind,
        actual: PhaseKind,
    },

    #[error("no players selected")]
    Empty,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    #[error(transparent)]
    Unbalanced(#[from] UnbalancedSettlementError),
}

/// A stored session that cannot be restored.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not a valid session: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("snapshot rejected: {0}")]
    Invalid(#[from] ValidationError),
}
