//! Carving a balanced subset out of a persisted event.
//!
//! Each chosen line keeps `amount - carve` under its original event (or is
//! deleted when that hits zero) and the carved amounts move to a fresh event
//! marked unsettled. Both sides stay zero-sum.

use std::collections::HashMap;

use crate::amount::Currency;
use crate::error::{UnbalancedSplitError, ValidationError};
use crate::model::{EventId, LedgerLine, LineId, LineStatus, NewEvent, NewLine};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Unbalanced(#[from] UnbalancedSplitError),
}

/// Store changes that perform a split. Applied as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    pub source: EventId,
    /// Lines whose amount shrinks to the given remainder.
    pub updates: Vec<(LineId, Currency)>,
    /// Lines fully carved out.
    pub deletions: Vec<LineId>,
    pub carved: NewEvent,
}

/// Plan a split of `lines` (all from one event). `carves` maps line ids to the
/// amount moved out of that line; lines without an entry are left alone.
pub fn plan(
    lines: &[LedgerLine],
    carves: &HashMap<LineId, Currency>,
) -> Result<SplitPlan, SplitError> {
    let first = lines.first().ok_or(ValidationError::EmptySplit)?;
    if let Some(other) = lines.iter().find(|l| l.event_id != first.event_id) {
        return Err(ValidationError::MixedEvents(first.event_id, other.event_id).into());
    }

    let mut unknown: Vec<LineId> = carves
        .keys()
        .filter(|id| !lines.iter().any(|l| l.id == **id))
        .copied()
        .collect();
    unknown.sort_unstable();
    if let Some(&id) = unknown.first() {
        return Err(ValidationError::UnknownLine(id).into());
    }

    let sum: Currency = carves.values().copied().sum();
    if !sum.is_zero() {
        return Err(UnbalancedSplitError { sum }.into());
    }

    let mut updates = Vec::new();
    let mut deletions = Vec::new();
    let mut carved = Vec::new();
    for line in lines {
        let carve = match carves.get(&line.id) {
            Some(c) if !c.is_zero() => *c,
            _ => continue,
        };
        let remainder = line.amount - carve;
        if remainder.is_zero() {
            deletions.push(line.id);
        } else {
            updates.push((line.id, remainder));
        }
        carved.push(NewLine {
            player: line.player.clone(),
            amount: carve,
        });
    }

    if carved.is_empty() {
        return Err(ValidationError::NothingCarved.into());
    }

    Ok(SplitPlan {
        source: first.event_id,
        updates,
        deletions,
        carved: NewEvent {
            id: EventId::generate(),
            status: LineStatus::Unsettled,
            lines: carved,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayerName;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn line(id: LineId, event: EventId, name: &str, amount: i64) -> LedgerLine {
        LedgerLine {
            id,
            event_id: event,
            player: PlayerName::new(name).unwrap(),
            amount: Currency::new(amount),
            status: LineStatus::Settled,
            created_at: Utc.with_ymd_and_hms(2024, 5, 4, 22, 0, 0).unwrap(),
        }
    }

    fn carves(pairs: &[(LineId, i64)]) -> HashMap<LineId, Currency> {
        pairs.iter().map(|&(id, c)| (id, Currency::new(c))).collect()
    }

    #[test]
    fn partial_carve_keeps_remainder() {
        let e1 = EventId::generate();
        let lines = vec![line(1, e1, "A", 2000), line(2, e1, "B", -2000)];

        let plan = plan(&lines, &carves(&[(1, 500), (2, -500)])).unwrap();

        assert_eq!(plan.source, e1);
        assert_eq!(
            plan.updates,
            vec![(1, Currency::new(1500)), (2, Currency::new(-1500))]
        );
        assert!(plan.deletions.is_empty());
        assert_ne!(plan.carved.id, e1);
        assert_eq!(plan.carved.status, LineStatus::Unsettled);
        assert_eq!(plan.carved.lines.len(), 2);
        assert_eq!(plan.carved.lines[0].amount, Currency::new(500));
        assert!(plan.carved.sum().is_zero());
    }

    #[test]
    fn full_carve_deletes_line() {
        let e1 = EventId::generate();
        let lines = vec![
            line(1, e1, "A", 2500),
            line(2, e1, "B", -1000),
            line(3, e1, "C", -1500),
        ];

        let plan = plan(&lines, &carves(&[(1, 1000), (2, -1000)])).unwrap();

        assert_eq!(plan.updates, vec![(1, Currency::new(1500))]);
        assert_eq!(plan.deletions, vec![2]);
        let names: Vec<_> = plan.carved.lines.iter().map(|l| l.player.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn zero_carves_are_ignored() {
        let e1 = EventId::generate();
        let lines = vec![
            line(1, e1, "A", 100),
            line(2, e1, "B", -50),
            line(3, e1, "C", -50),
        ];

        let plan = plan(&lines, &carves(&[(1, 50), (2, -50), (3, 0)])).unwrap();
        assert_eq!(plan.carved.lines.len(), 2);
        assert!(plan.updates.iter().all(|(id, _)| *id != 3));
        assert!(!plan.deletions.contains(&3));
    }

    #[test]
    fn unbalanced_carve_rejected() {
        let e1 = EventId::generate();
        let lines = vec![line(1, e1, "A", 2000), line(2, e1, "B", -2000)];

        let err = plan(&lines, &carves(&[(1, -500)])).unwrap_err();
        assert_eq!(
            err,
            SplitError::Unbalanced(UnbalancedSplitError {
                sum: Currency::new(-500)
            })
        );
    }

    #[test]
    fn nothing_carved_rejected() {
        let e1 = EventId::generate();
        let lines = vec![line(1, e1, "A", 10), line(2, e1, "B", -10)];
        assert_eq!(
            plan(&lines, &carves(&[])).unwrap_err(),
            SplitError::Validation(ValidationError::NothingCarved)
        );
        assert_eq!(
            plan(&lines, &carves(&[(1, 0)])).unwrap_err(),
            SplitError::Validation(ValidationError::NothingCarved)
        );
    }

    #[test]
    fn unknown_line_rejected() {
        let e1 = EventId::generate();
        let lines = vec![line(1, e1, "A", 10), line(2, e1, "B", -10)];
        assert_eq!(
            plan(&lines, &carves(&[(1, 5), (9, -5)])).unwrap_err(),
            SplitError::Validation(ValidationError::UnknownLine(9))
        );
    }

    #[test]
    fn mixed_events_rejected() {
        let e1 = EventId::generate();
        let e2 = EventId::generate();
        let lines = vec![line(1, e1, "A", 10), line(2, e2, "B", -10)];
        assert_eq!(
            plan(&lines, &carves(&[(1, 5), (2, -5)])).unwrap_err(),
            SplitError::Validation(ValidationError::MixedEvents(e1, e2))
        );
    }

    #[test]
    fn empty_lines_rejected() {
        assert_eq!(
            plan(&[], &carves(&[])).unwrap_err(),
            SplitError::Validation(ValidationError::EmptySplit)
        );
    }

    proptest! {
        #[test]
        fn split_conserves_each_players_total(
            amounts in proptest::collection::vec(-5_000i64..5_000, 1..6),
            raw_carves in proptest::collection::vec(-5_000i64..5_000, 1..6),
        ) {
            let e1 = EventId::generate();
            let mut amounts = amounts;
            let balance: i64 = amounts.iter().sum();
            amounts.push(-balance);
            let lines: Vec<_> = amounts
                .iter()
                .enumerate()
                .map(|(i, a)| line(i as LineId + 1, e1, &format!("P{i}"), *a))
                .collect();

            let mut chosen: Vec<(LineId, i64)> = raw_carves
                .iter()
                .take(lines.len() - 1)
                .enumerate()
                .map(|(i, c)| (i as LineId + 1, *c))
                .collect();
            let carved_sum: i64 = chosen.iter().map(|(_, c)| c).sum();
            chosen.push((lines.len() as LineId, -carved_sum));
            prop_assume!(chosen.iter().any(|(_, c)| *c != 0));

            let plan = plan(&lines, &carves(&chosen)).unwrap();

            for l in &lines {
                let remainder = plan
                    .updates
                    .iter()
                    .find(|(id, _)| *id == l.id)
                    .map(|(_, r)| *r)
                    .unwrap_or(if plan.deletions.contains(&l.id) { Currency::ZERO } else { l.amount });
                let carved: Currency = plan
                    .carved
                    .lines
                    .iter()
                    .filter(|n| n.player == l.player)
                    .map(|n| n.amount)
                    .sum();
                prop_assert_eq!(remainder + carved, l.amount);
            }
            prop_assert!(plan.carved.sum().is_zero());
        }
    }
}
