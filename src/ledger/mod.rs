//! Ledger service.
//!
//! Ties sessions to the durable store and the local draft store. Every write
//! happens only after the in-memory checks pass, and a failed write leaves the
//! caller's session as it was so nothing entered is lost.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::amount::Currency;
use crate::chips::ChipTally;
use crate::config::Config;
use crate::engine::Session;
use crate::model::{EventId, LedgerLine, LineId, LineStatus, PlayerName, SettlementEvent};
use crate::ranking::{self, DateRange, Standing};
use crate::split;
use crate::store::{DraftStore, LedgerStore, MemoryDraftStore};

mod error;
pub use error::LedgerError;

pub struct Ledger<S, D = MemoryDraftStore> {
    store: S,
    drafts: D,
    config: Config,
}

/// Public API
impl<S: LedgerStore, D: DraftStore> Ledger<S, D> {
    pub fn new(store: S, drafts: D, config: Config) -> Self {
        Self {
            store,
            drafts,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tally(&self) -> ChipTally {
        self.config.tally()
    }

    /// Fresh session using the configured baseline and ratio.
    pub fn new_session(&self) -> Session {
        Session::from_config(&self.config)
    }

    pub async fn roster(&self) -> Result<Vec<PlayerName>, LedgerError> {
        Ok(self.store.list_players().await?)
    }

    pub async fn register_player(&self, name: &str) -> Result<PlayerName, LedgerError> {
        let player = PlayerName::new(name)?;
        let result = self.store.insert_player(&player).await;
        Self::log_result("register player", &player, &result);
        result?;
        Ok(player)
    }

    /// Remove a player from the roster. Their past lines are kept.
    pub async fn remove_player(&self, player: &PlayerName) -> Result<(), LedgerError> {
        let result = self.store.delete_player(player).await;
        Self::log_result("remove player", player, &result);
        Ok(result?)
    }

    /// Persist a converted session as one event and reset it for the next game.
    pub async fn commit(&self, session: &mut Session) -> Result<SettlementEvent, LedgerError> {
        let event = session.settle(EventId::generate())?;
        let lines = match self.store.insert_event(&event).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(event = %event.id, reason = %e, "commit failed, session kept");
                return Err(e.into());
            }
        };

        session.reset();
        if let Err(e) = self.drafts.clear() {
            warn!(reason = %e, "failed to clear draft after commit");
        }
        info!(event = %event.id, lines = lines.len(), "event committed");

        SettlementEvent::group(lines)
            .pop()
            .ok_or(LedgerError::EmptyEvent(event.id))
    }

    pub fn save_draft(&self, session: &Session) -> Result<(), LedgerError> {
        Ok(self.drafts.save_session(session)?)
    }

    /// The drafted session, or a fresh one when there is none.
    pub fn restore_draft(&self) -> Result<Session, LedgerError> {
        match self.drafts.load_session()? {
            Some(session) => {
                info!(players = session.selected().len(), "draft restored");
                Ok(session)
            }
            None => Ok(self.new_session()),
        }
    }

    /// Throw away the session and its draft.
    pub fn discard(&self, session: &mut Session) -> Result<(), LedgerError> {
        session.reset();
        Ok(self.drafts.clear()?)
    }

    /// All events, newest first.
    pub async fn events(&self) -> Result<Vec<SettlementEvent>, LedgerError> {
        Ok(SettlementEvent::group(self.store.list_lines().await?))
    }

    pub async fn event(&self, id: &EventId) -> Result<SettlementEvent, LedgerError> {
        let lines: Vec<LedgerLine> = self
            .store
            .list_lines()
            .await?
            .into_iter()
            .filter(|l| l.event_id == *id)
            .collect();
        SettlementEvent::group(lines)
            .pop()
            .ok_or(LedgerError::EmptyEvent(*id))
    }

    pub async fn set_status(&self, id: &EventId, status: LineStatus) -> Result<usize, LedgerError> {
        let touched = self.store.set_event_status(id, status).await?;
        info!(event = %id, %status, lines = touched, "status updated");
        Ok(touched)
    }

    /// Flip an event between settled and unsettled. Returns the new status.
    pub async fn toggle_status(&self, id: &EventId) -> Result<LineStatus, LedgerError> {
        let event = self.event(id).await?;
        let status = event
            .lines
            .first()
            .map(|l| l.status.toggled())
            .ok_or(LedgerError::EmptyEvent(*id))?;
        self.set_status(id, status).await?;
        Ok(status)
    }

    /// Carve a balanced subset out of an event into a new unsettled event.
    pub async fn split(
        &self,
        id: &EventId,
        carves: &HashMap<LineId, Currency>,
    ) -> Result<SettlementEvent, LedgerError> {
        let event = self.event(id).await?;
        let plan = split::plan(&event.lines, carves)?;
        let carved_id = plan.carved.id;
        let lines = self.store.apply_split(&plan).await?;
        info!(
            event = %id,
            carved = %carved_id,
            updated = plan.updates.len(),
            deleted = plan.deletions.len(),
            "event split"
        );
        SettlementEvent::group(lines)
            .pop()
            .ok_or(LedgerError::EmptyEvent(carved_id))
    }

    pub async fn delete_event(&self, id: &EventId) -> Result<usize, LedgerError> {
        let removed = self.store.delete_event(id).await?;
        info!(event = %id, lines = removed, "event deleted");
        Ok(removed)
    }

    pub async fn standings(&self, range: &DateRange) -> Result<Vec<Standing>, LedgerError> {
        let events = self.events().await?;
        Ok(ranking::aggregate(&events, range))
    }
}

/// Private API
impl<S: LedgerStore, D: DraftStore> Ledger<S, D> {
    fn log_result<E: std::fmt::Display>(op: &str, player: &PlayerName, result: &Result<(), E>) {
        match result {
            Ok(()) => info!(player = %player, "{op} applied"),
            Err(e) => warn!(player = %player, reason = %e, "{op} skipped"),
        }
    }
}
