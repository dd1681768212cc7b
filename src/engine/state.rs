use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::amount::{Points, Unit, UnitConverter};
use crate::model::PlayerName;

/// A player's value as currently entered, in the unit it was entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkingValue {
    pub amount: i64,
    pub unit: Unit,
}

impl WorkingValue {
    pub fn points(amount: Points) -> Self {
        Self {
            amount: amount.value(),
            unit: Unit::Points,
        }
    }

    pub fn in_points(&self, converter: &UnitConverter) -> Points {
        converter.points_of(self.amount, self.unit)
    }
}

/// Where a session stands between data entry and commit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Raw stacks are being entered.
    #[default]
    Collecting,
    /// Values are net results; `raw` holds what was entered before conversion.
    Converted { raw: HashMap<PlayerName, WorkingValue> },
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Collecting => PhaseKind::Collecting,
            Phase::Converted { .. } => PhaseKind::Converted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Collecting,
    Converted,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::Collecting => f.write_str("collecting"),
            PhaseKind::Converted => f.write_str("converted"),
        }
    }
}
