//! Error taxonomy shared by the settlement components.

use thiserror::Error;

use crate::amount::{Currency, Points};
use crate::model::{EventId, LineId, PlayerName};

/// Input rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("player name must not be empty")]
    EmptyPlayerName,

    #[error("chip count for denomination {denomination} is negative ({count})")]
    NegativeChipCount { denomination: i64, count: i64 },

    #[error("denomination {0} is not in the configured chip set")]
    UnknownDenomination(i64),

    #[error("chip total overflows")]
    ChipTotalOverflow,

    #[error("conversion ratio must be positive on both sides, got {points}:{currency}")]
    InvalidRatio { points: i64, currency: i64 },

    #[error("baseline must not be negative, got {0}")]
    NegativeBaseline(Points),

    #[error("loan amount must be positive, got {0}")]
    NonPositiveLoan(Points),

    #[error("loan must move points between two different parties")]
    SelfLoan,

    #[error("loan references {0}, who is not part of the session")]
    LoanPartyNotSelected(PlayerName),

    #[error("{0} is not part of the session")]
    NotSelected(PlayerName),

    #[error("{player}: {points} points do not convert to a whole currency amount")]
    InexactConversion { player: PlayerName, points: Points },

    #[error("no loan at position {0}")]
    NoSuchLoan(usize),

    #[error("split needs at least one line")]
    EmptySplit,

    #[error("split carves nothing out")]
    NothingCarved,

    #[error("lines belong to more than one event ({0} and {1})")]
    MixedEvents(EventId, EventId),

    #[error("line {0} is not part of the event being split")]
    UnknownLine(LineId),
}

/// Chip totals do not match the expected table total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("chips {direction} by {} points (expected {expected}, counted {actual})", .difference.value().abs())]
pub struct ReconciliationError {
    pub expected: Points,
    pub actual: Points,
    /// `actual - expected`: positive when over, negative when short.
    pub difference: Points,
    direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Short,
    Over,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Short => f.write_str("short"),
            Direction::Over => f.write_str("over"),
        }
    }
}

impl ReconciliationError {
    pub fn new(expected: Points, actual: Points) -> Self {
        let difference = actual - expected;
        let direction = if difference.value() < 0 {
            Direction::Short
        } else {
            Direction::Over
        };
        Self {
            expected,
            actual,
            difference,
            direction,
        }
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }
}

/// Final point values of a session do not net to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("settlement does not balance: final points sum to {sum}")]
pub struct UnbalancedSettlementError {
    pub sum: Points,
}

/// Carved-out amounts do not net to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("split does not balance: carved amounts sum to {sum}")]
pub struct UnbalancedSplitError {
    pub sum: Currency,
}
