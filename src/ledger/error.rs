use thiserror::Error;

use crate::engine::SessionError;
use crate::error::ValidationError;
use crate::model::EventId;
use crate::split::SplitError;
use crate::store::{DraftError, StoreError};

/// Top-level error returned by [`Ledger`](super::Ledger) operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("settlement failed: {0}")]
    Session(#[from] SessionError),

    #[error("split failed: {0}")]
    Split(#[from] SplitError),

    #[error("event {0} has no lines")]
    EmptyEvent(EventId),

    #[error("store request failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Draft(#[from] DraftError),
}
