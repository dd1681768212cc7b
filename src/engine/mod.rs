//! Settlement engine.
//!
//! A [`Session`] collects the raw chip stacks of the players at the table,
//! reconciles them (with any loans) against the expected table total, turns
//! them into net results and finally produces a zero-sum [`NewEvent`] ready to
//! be persisted.
//!
//! ```text
//! Collecting --convert--> Converted --settle--> (persisted, reset to Collecting)
//!     ^                       |
//!     +--------revert---------+
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::amount::{Points, Unit, UnitConverter};
use crate::chips::{ChipCount, ChipTally};
use crate::config::Config;
use crate::error::{ReconciliationError, UnbalancedSettlementError, ValidationError};
use crate::loans::LoanLedger;
use crate::model::{EventId, LineStatus, Loan, NewEvent, NewLine, Party, PlayerName};

mod state;
pub use state::{Phase, PhaseKind, WorkingValue};

mod error;
pub use error::{SessionError, SnapshotError};

/// In-progress settlement for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    baseline: Points,
    converter: UnitConverter,
    /// Selection order is the order lines are written in.
    selected: Vec<PlayerName>,
    values: HashMap<PlayerName, WorkingValue>,
    chips: HashMap<PlayerName, ChipCount>,
    loans: LoanLedger,
    phase: Phase,
}

/// Public API
impl Session {
    pub fn new(baseline: Points, converter: UnitConverter) -> Self {
        Self {
            baseline,
            converter,
            selected: Vec::new(),
            values: HashMap::new(),
            chips: HashMap::new(),
            loans: LoanLedger::new(),
            phase: Phase::Collecting,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.baseline, config.converter())
    }

    pub fn baseline(&self) -> Points {
        self.baseline
    }

    pub fn converter(&self) -> UnitConverter {
        self.converter
    }

    pub fn phase(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn selected(&self) -> &[PlayerName] {
        &self.selected
    }

    pub fn is_selected(&self, player: &PlayerName) -> bool {
        self.selected.contains(player)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.loans.is_empty()
    }

    /// Add a player to the table. Selecting twice is a no-op.
    pub fn select(&mut self, player: PlayerName) -> Result<(), SessionError> {
        self.require(PhaseKind::Collecting)?;
        if !self.is_selected(&player) {
            self.selected.push(player);
        }
        Ok(())
    }

    /// Remove a player along with their entered value and chips.
    pub fn deselect(&mut self, player: &PlayerName) -> Result<(), SessionError> {
        self.require(PhaseKind::Collecting)?;
        self.selected.retain(|p| p != player);
        self.values.remove(player);
        self.chips.remove(player);
        Ok(())
    }

    /// Select the player if absent, deselect otherwise. Returns whether they are now selected.
    pub fn toggle(&mut self, player: PlayerName) -> Result<bool, SessionError> {
        if self.is_selected(&player) {
            self.deselect(&player)?;
            Ok(false)
        } else {
            self.select(player)?;
            Ok(true)
        }
    }

    pub fn value(&self, player: &PlayerName) -> Option<WorkingValue> {
        self.values.get(player).copied()
    }

    /// The player's working value in points, zero when nothing was entered.
    pub fn points(&self, player: &PlayerName) -> Points {
        self.values
            .get(player)
            .map(|v| v.in_points(&self.converter))
            .unwrap_or_default()
    }

    /// Overwrite a player's working value. Allowed in both phases.
    pub fn set_value(
        &mut self,
        player: &PlayerName,
        amount: i64,
        unit: Unit,
    ) -> Result<(), SessionError> {
        self.require_selected(player)?;
        self.values
            .insert(player.clone(), WorkingValue { amount, unit });
        Ok(())
    }

    /// Re-express a player's working value in another unit. Lossy for odd points.
    pub fn switch_unit(
        &mut self,
        player: &PlayerName,
        unit: Unit,
    ) -> Result<WorkingValue, SessionError> {
        self.require_selected(player)?;
        let current = self.value(player).unwrap_or_default();
        let switched = WorkingValue {
            amount: self.converter.convert(current.amount, current.unit, unit),
            unit,
        };
        self.values.insert(player.clone(), switched);
        Ok(switched)
    }

    pub fn chips(&self, player: &PlayerName) -> Option<&ChipCount> {
        self.chips.get(player)
    }

    /// Store a player's counted chips and use their total as the working value.
    pub fn record_chips(
        &mut self,
        player: &PlayerName,
        chips: ChipCount,
        tally: &ChipTally,
    ) -> Result<Points, SessionError> {
        self.require(PhaseKind::Collecting)?;
        self.require_selected(player)?;
        let total = tally.total(&chips)?;
        self.chips.insert(player.clone(), chips);
        self.values
            .insert(player.clone(), WorkingValue::points(total));
        Ok(total)
    }

    pub fn loans(&self) -> &LoanLedger {
        &self.loans
    }

    pub fn add_loan(&mut self, from: Party, to: Party, amount: Points) -> Result<(), SessionError> {
        self.require(PhaseKind::Collecting)?;
        self.loans.add(from, to, amount)?;
        Ok(())
    }

    pub fn remove_loan(&mut self, index: usize) -> Result<Loan, SessionError> {
        self.require(PhaseKind::Collecting)?;
        Ok(self.loans.remove(index)?)
    }

    /// Table total the raw stacks must add up to.
    pub fn expected_total(&self) -> Points {
        Points::new(self.selected.len() as i64 * self.baseline.value()) + self.loans.house_surplus()
    }

    /// Σ working values of the selected players, in points.
    pub fn total_points(&self) -> Points {
        self.selected.iter().map(|p| self.points(p)).sum()
    }

    /// Reconcile raw stacks against the table total and turn them into net results.
    ///
    /// Each player ends up with `raw - baseline + loan effect` points.
    pub fn convert(&mut self) -> Result<(), SessionError> {
        self.require(PhaseKind::Collecting)?;
        if self.selected.is_empty() {
            return Err(SessionError::Empty);
        }
        if let Some(stranger) = self.loans.players().find(|p| !self.is_selected(p)) {
            return Err(ValidationError::LoanPartyNotSelected(stranger.clone()).into());
        }

        let expected = self.expected_total();
        let actual = self.total_points();
        if actual != expected {
            let err = ReconciliationError::new(expected, actual);
            warn!(
                expected = %expected,
                actual = %actual,
                difference = %err.difference,
                "conversion rejected"
            );
            return Err(err.into());
        }

        let raw = std::mem::take(&mut self.values);
        for player in &self.selected {
            let raw_points = raw
                .get(player)
                .map(|v| v.in_points(&self.converter))
                .unwrap_or_default();
            let net = raw_points - self.baseline + self.loans.net_effect(player);
            self.values.insert(player.clone(), WorkingValue::points(net));
        }
        self.phase = Phase::Converted { raw };

        info!(
            players = self.selected.len(),
            loans = self.loans.len(),
            total = %actual,
            "session converted"
        );
        Ok(())
    }

    /// Go back to data entry with the values entered before conversion.
    pub fn revert(&mut self) -> Result<(), SessionError> {
        self.require(PhaseKind::Converted)?;
        if let Phase::Converted { raw } = std::mem::take(&mut self.phase) {
            self.values = raw;
        }
        Ok(())
    }

    /// Build the event to persist. Does not change the session; call
    /// [`Session::reset`] once the event has been stored.
    pub fn settle(&self, id: EventId) -> Result<NewEvent, SessionError> {
        self.require(PhaseKind::Converted)?;
        if self.selected.is_empty() {
            return Err(SessionError::Empty);
        }

        let sum = self.total_points();
        if !sum.is_zero() {
            warn!(sum = %sum, "settlement rejected");
            return Err(UnbalancedSettlementError { sum }.into());
        }

        let lines = self
            .selected
            .iter()
            .map(|player| {
                let points = self.points(player);
                let amount = self.converter.to_currency_exact(points).ok_or_else(|| {
                    ValidationError::InexactConversion {
                        player: player.clone(),
                        points,
                    }
                })?;
                Ok::<_, SessionError>(NewLine {
                    player: player.clone(),
                    amount,
                })
            })
            .collect::<Result<Vec<_>, SessionError>>()?;

        Ok(NewEvent {
            id,
            status: LineStatus::Settled,
            lines,
        })
    }

    /// Discard everything entered and start collecting again.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.values.clear();
        self.chips.clear();
        self.loans.clear();
        self.phase = Phase::Collecting;
    }

    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a session written by [`Session::to_snapshot`]. Snapshots with a
    /// ratio or baseline a config would refuse are rejected.
    pub fn from_snapshot(snapshot: &str) -> Result<Self, SnapshotError> {
        let session: Session = serde_json::from_str(snapshot)?;
        session.check_settings()?;
        Ok(session)
    }
}

/// Private API
impl Session {
    fn check_settings(&self) -> Result<(), ValidationError> {
        let ratio = self.converter.ratio();
        if !ratio.is_valid() {
            return Err(ValidationError::InvalidRatio {
                points: ratio.points,
                currency: ratio.currency,
            });
        }
        if self.baseline.value() < 0 {
            return Err(ValidationError::NegativeBaseline(self.baseline));
        }
        Ok(())
    }

    fn require(&self, expected: PhaseKind) -> Result<(), SessionError> {
        let actual = self.phase.kind();
        if actual != expected {
            return Err(SessionError::WrongPhase { expected, actual });
        }
        Ok(())
    }

    fn require_selected(&self, player: &PlayerName) -> Result<(), SessionError> {
        if !self.is_selected(player) {
            return Err(ValidationError::NotSelected(player.clone()).into());
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
