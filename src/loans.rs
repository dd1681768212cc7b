//! Pairwise point transfers made during play.
//!
//! Sign convention: the lender (`from`) is owed the amount, so their settlement
//! balance goes up by it, and the borrower (`to`) goes down by it. The house
//! has no balance of its own; loans touching it shift the expected table total
//! instead (see [`LoanLedger::house_surplus`]).

use serde::{Deserialize, Serialize};

use crate::amount::Points;
use crate::error::ValidationError;
use crate::model::{Loan, Party, PlayerName};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoanLedger {
    loans: Vec<Loan>,
}

impl LoanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` gave `amount` points to `to`.
    pub fn add(&mut self, from: Party, to: Party, amount: Points) -> Result<(), ValidationError> {
        if amount.value() <= 0 {
            return Err(ValidationError::NonPositiveLoan(amount));
        }
        if from == to {
            return Err(ValidationError::SelfLoan);
        }
        self.loans.push(Loan { from, to, amount });
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Loan, ValidationError> {
        if index >= self.loans.len() {
            return Err(ValidationError::NoSuchLoan(index));
        }
        Ok(self.loans.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Loan> + '_ {
        self.loans.iter()
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    pub fn clear(&mut self) {
        self.loans.clear();
    }

    /// Net settlement adjustment for one player.
    pub fn net_effect(&self, player: &PlayerName) -> Points {
        self.loans
            .iter()
            .map(|loan| {
                let mut effect = Points::ZERO;
                if loan.from.is(player) {
                    effect += loan.amount;
                }
                if loan.to.is(player) {
                    effect -= loan.amount;
                }
                effect
            })
            .sum()
    }

    /// Points the house put into play (positive) or took out of it (negative).
    pub fn house_surplus(&self) -> Points {
        self.loans
            .iter()
            .map(|loan| match (&loan.from, &loan.to) {
                (Party::House, Party::Player(_)) => loan.amount,
                (Party::Player(_), Party::House) => -loan.amount,
                _ => Points::ZERO,
            })
            .sum()
    }

    /// Players named by any loan.
    pub fn players(&self) -> impl Iterator<Item = &PlayerName> + '_ {
        self.loans
            .iter()
            .flat_map(|loan| [&loan.from, &loan.to])
            .filter_map(|party| match party {
                Party::Player(name) => Some(name),
                Party::House => None,
            })
    }
}
