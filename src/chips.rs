use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::amount::Points;
use crate::error::ValidationError;

/// Chip face values used when nothing else is configured.
pub const DEFAULT_DENOMINATIONS: [i64; 5] = [50, 100, 500, 1000, 5000];

/// Counted chips of one stack, keyed by face value. Missing denominations count as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChipCount(BTreeMap<i64, i64>);

impl ChipCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, denomination: i64, count: i64) {
        self.0.insert(denomination, count);
    }

    pub fn with(mut self, denomination: i64, count: i64) -> Self {
        self.set(denomination, count);
        self
    }

    pub fn count(&self, denomination: i64) -> i64 {
        self.0.get(&denomination).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.0.iter().map(|(&d, &c)| (d, c))
    }
}

/// Sums chip counts over a fixed set of denominations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipTally {
    denominations: BTreeSet<i64>,
}

impl Default for ChipTally {
    fn default() -> Self {
        Self::new(DEFAULT_DENOMINATIONS)
    }
}

impl ChipTally {
    pub fn new(denominations: impl IntoIterator<Item = i64>) -> Self {
        Self {
            denominations: denominations.into_iter().collect(),
        }
    }

    pub fn denominations(&self) -> impl Iterator<Item = i64> + '_ {
        self.denominations.iter().copied()
    }

    /// Σ face value × count.
    pub fn total(&self, chips: &ChipCount) -> Result<Points, ValidationError> {
        let mut total = Points::ZERO;
        for (denomination, count) in chips.iter() {
            if !self.denominations.contains(&denomination) {
                return Err(ValidationError::UnknownDenomination(denomination));
            }
            if count < 0 {
                return Err(ValidationError::NegativeChipCount {
                    denomination,
                    count,
                });
            }
            let value = denomination
                .checked_mul(count)
                .and_then(|value| value.checked_add(total.value()))
                .ok_or(ValidationError::ChipTotalOverflow)?;
            total = Points::new(value);
        }
        Ok(total)
    }
}
