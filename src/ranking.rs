//! Standings across settled events.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::amount::Currency;
use crate::model::{PlayerName, SettlementEvent};

/// Inclusive range of whole UTC days. Open on a side when that bound is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &SettlementEvent) -> bool {
        let day = event.created_at.date_naive();
        self.start.is_none_or(|start| day >= start) && self.end.is_none_or(|end| day <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub name: PlayerName,
    pub total: Currency,
    pub games: u32,
}

/// Per-player totals and line counts over the events in `range`, ordered by
/// total descending, then name ascending.
pub fn aggregate(events: &[SettlementEvent], range: &DateRange) -> Vec<Standing> {
    let mut standings: Vec<Standing> = Vec::new();
    let mut index: HashMap<&PlayerName, usize> = HashMap::new();

    for event in events.iter().filter(|e| range.contains(e)) {
        for line in &event.lines {
            let pos = *index.entry(&line.player).or_insert_with(|| {
                standings.push(Standing {
                    name: line.player.clone(),
                    total: Currency::ZERO,
                    games: 0,
                });
                standings.len() - 1
            });
            standings[pos].total += line.amount;
            standings[pos].games += 1;
        }
    }

    standings.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventId, LedgerLine, LineStatus};
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn event(created_at: DateTime<Utc>, lines: &[(&str, i64)]) -> SettlementEvent {
        let id = EventId::generate();
        SettlementEvent {
            id,
            created_at,
            lines: lines
                .iter()
                .enumerate()
                .map(|(i, (name, amount))| LedgerLine {
                    id: i as u64,
                    event_id: id,
                    player: PlayerName::new(name).unwrap(),
                    amount: Currency::new(*amount),
                    status: LineStatus::Settled,
                    created_at,
                })
                .collect(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rows(standings: &[Standing]) -> Vec<(&str, i64, u32)> {
        standings
            .iter()
            .map(|s| (s.name.as_str(), s.total.value(), s.games))
            .collect()
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(aggregate(&[], &DateRange::all()).is_empty());
    }

    #[test]
    fn sums_totals_and_counts_games() {
        let events = vec![
            event(at(2024, 1, 5, 21), &[("A", 2500), ("B", -1000), ("C", -1500)]),
            event(at(2024, 1, 12, 21), &[("A", -500), ("B", 500)]),
        ];
        let standings = aggregate(&events, &DateRange::all());
        assert_eq!(
            rows(&standings),
            vec![("A", 2000, 2), ("B", -500, 2), ("C", -1500, 1)]
        );
    }

    #[test]
    fn ties_break_by_name() {
        let events = vec![event(at(2024, 1, 5, 21), &[("Zoe", 100), ("Amy", 100), ("Bob", -200)])];
        let standings = aggregate(&events, &DateRange::all());
        assert_eq!(
            rows(&standings),
            vec![("Amy", 100, 1), ("Zoe", 100, 1), ("Bob", -200, 1)]
        );
    }

    #[test]
    fn range_is_inclusive_by_day() {
        let events = vec![
            event(at(2024, 1, 31, 23), &[("A", 100), ("B", -100)]),
            event(at(2024, 2, 1, 0), &[("A", 10), ("B", -10)]),
            event(at(2024, 2, 29, 23), &[("A", 1), ("B", -1)]),
            event(at(2024, 3, 1, 0), &[("A", 1000), ("B", -1000)]),
        ];
        let range = DateRange {
            start: Some(date(2024, 2, 1)),
            end: Some(date(2024, 2, 29)),
        };
        assert_eq!(
            rows(&aggregate(&events, &range)),
            vec![("A", 11, 2), ("B", -11, 2)]
        );
    }

    #[test]
    fn open_ended_ranges() {
        let events = vec![
            event(at(2024, 1, 1, 20), &[("A", 100), ("B", -100)]),
            event(at(2024, 6, 1, 20), &[("A", -40), ("B", 40)]),
        ];
        let from_june = DateRange {
            start: Some(date(2024, 6, 1)),
            end: None,
        };
        assert_eq!(
            rows(&aggregate(&events, &from_june)),
            vec![("B", 40, 1), ("A", -40, 1)]
        );

        let until_may = DateRange {
            start: None,
            end: Some(date(2024, 5, 31)),
        };
        assert_eq!(
            rows(&aggregate(&events, &until_may)),
            vec![("A", 100, 1), ("B", -100, 1)]
        );
    }

    proptest! {
        #[test]
        fn aggregation_is_idempotent_and_monotone_in_games(
            base in proptest::collection::vec((0usize..4, -1000i64..1000), 0..20),
            extra in proptest::collection::vec((0usize..4, -1000i64..1000), 1..10),
        ) {
            let names = ["A", "B", "C", "D"];
            let to_events = |pairs: &[(usize, i64)]| -> Vec<SettlementEvent> {
                pairs
                    .iter()
                    .map(|(p, a)| event(at(2024, 4, 1, 20), &[(names[*p], *a)]))
                    .collect()
            };
            let events = to_events(&base[..]);
            let first = aggregate(&events, &DateRange::all());
            let second = aggregate(&events, &DateRange::all());
            prop_assert_eq!(&first, &second);

            let mut superset = events.clone();
            superset.extend(to_events(&extra[..]));
            let grown = aggregate(&superset, &DateRange::all());
            for s in &first {
                let after = grown.iter().find(|g| g.name == s.name).unwrap();
                prop_assert!(after.games >= s.games);
            }
        }
    }
}
