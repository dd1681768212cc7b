//! Boundaries to the durable ledger store and the local draft store.

use std::future::Future;
use thiserror::Error;

use crate::model::{EventId, LedgerLine, LineStatus, NewEvent, PlayerName};
use crate::split::SplitPlan;

mod draft;
pub use draft::{DraftError, DraftStore, FileDraftStore, MemoryDraftStore};

mod memory;
pub use memory::MemoryStore;

/// Failure of a durable store call. Nothing was written when one of these is returned.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("player {0} already exists")]
    DuplicatePlayer(PlayerName),

    #[error("player {0} not found")]
    PlayerNotFound(PlayerName),

    #[error("event {0} not found")]
    EventNotFound(EventId),

    #[error("line {0} not found")]
    LineNotFound(u64),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Remote tabular store holding the roster and the ledger rows.
pub trait LedgerStore {
    fn list_players(&self) -> impl Future<Output = Result<Vec<PlayerName>, StoreError>> + Send;

    /// Fails with [`StoreError::DuplicatePlayer`] when the name is taken.
    fn insert_player(
        &self,
        player: &PlayerName,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_player(
        &self,
        player: &PlayerName,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All rows, newest first.
    fn list_lines(&self) -> impl Future<Output = Result<Vec<LedgerLine>, StoreError>> + Send;

    /// Insert every line of `event` in one call; ids and timestamp are assigned by the store.
    fn insert_event(
        &self,
        event: &NewEvent,
    ) -> impl Future<Output = Result<Vec<LedgerLine>, StoreError>> + Send;

    /// Set the status of every line of an event. Returns the number of rows touched.
    fn set_event_status(
        &self,
        event: &EventId,
        status: LineStatus,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn delete_event(&self, event: &EventId)
    -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Apply remainder updates, deletions and the carved event atomically.
    fn apply_split(
        &self,
        plan: &SplitPlan,
    ) -> impl Future<Output = Result<Vec<LedgerLine>, StoreError>> + Send;
}
