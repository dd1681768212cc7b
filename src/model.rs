//! Core domain types for the settlement ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::amount::{Currency, Points};
use crate::error::ValidationError;

/// Display name identifying a player. Never empty, surrounding whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPlayerName);
        }
        Ok(PlayerName(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PlayerName::new(value)
    }
}

impl From<PlayerName> for String {
    fn from(value: PlayerName) -> Self {
        value.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Groups the lines produced by one settlement action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn generate() -> Self {
        EventId(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        EventId(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row identifier assigned by the store.
pub type LineId = u64;

/// Whether a line's amount has changed hands yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    Unsettled,
    Settled,
}

impl LineStatus {
    pub fn toggled(self) -> Self {
        match self {
            LineStatus::Unsettled => LineStatus::Settled,
            LineStatus::Settled => LineStatus::Unsettled,
        }
    }
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineStatus::Unsettled => f.write_str("unsettled"),
            LineStatus::Settled => f.write_str("settled"),
        }
    }
}

/// A persisted ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub id: LineId,
    pub event_id: EventId,
    pub player: PlayerName,
    pub amount: Currency,
    pub status: LineStatus,
    pub created_at: DateTime<Utc>,
}

/// One line of an event that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
    pub player: PlayerName,
    pub amount: Currency,
}

/// A batch of lines to be inserted together under one event id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub id: EventId,
    pub status: LineStatus,
    pub lines: Vec<NewLine>,
}

impl NewEvent {
    pub fn sum(&self) -> Currency {
        self.lines.iter().map(|l| l.amount).sum()
    }
}

/// Persisted lines sharing one event id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementEvent {
    pub id: EventId,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<LedgerLine>,
}

impl SettlementEvent {
    /// Fold store rows into events, in the order each event is first seen.
    pub fn group(lines: impl IntoIterator<Item = LedgerLine>) -> Vec<SettlementEvent> {
        let mut events: Vec<SettlementEvent> = Vec::new();
        let mut index = std::collections::HashMap::new();
        for line in lines {
            match index.get(&line.event_id) {
                Some(&pos) => {
                    let event: &mut SettlementEvent = &mut events[pos];
                    event.lines.push(line);
                }
                None => {
                    index.insert(line.event_id, events.len());
                    events.push(SettlementEvent {
                        id: line.event_id,
                        created_at: line.created_at,
                        lines: vec![line],
                    });
                }
            }
        }
        events
    }

    pub fn sum(&self) -> Currency {
        self.lines.iter().map(|l| l.amount).sum()
    }
}

/// One side of a loan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    /// Chips held in reserve, not belonging to any player.
    House,
    Player(PlayerName),
}

impl Party {
    pub fn player(name: impl AsRef<str>) -> Result<Self, ValidationError> {
        PlayerName::new(name).map(Party::Player)
    }

    pub fn is(&self, player: &PlayerName) -> bool {
        matches!(self, Party::Player(p) if p == player)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::House => f.write_str("house"),
            Party::Player(name) => fmt::Display::fmt(name, f),
        }
    }
}

/// `from` handed `amount` points to `to` during play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub from: Party,
    pub to: Party,
    pub amount: Points,
}
