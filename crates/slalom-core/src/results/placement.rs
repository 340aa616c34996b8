//! Individual placement points.

use std::collections::BTreeMap;

use super::model::{ResultEntry, RunResult};
use crate::domain::{Gender, ScoringClass};

/// Points by rank; rank 31 and beyond score nothing.
pub const POINT_LADDER: [u32; 30] = [
    100, 80, 60, 50, 45, 40, 36, 32, 29, 26, 24, 22, 20, 18, 16, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6,
    5, 4, 3, 2, 1,
];

/// Competition ranks ("1224") for values already sorted ascending.
pub fn competition_ranks<T: PartialEq>(sorted: &[T]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(sorted.len());
    for (idx, value) in sorted.iter().enumerate() {
        let rank = match idx {
            0 => 1,
            _ if sorted[idx - 1] == *value => ranks[idx - 1],
            _ => idx as u32 + 1,
        };
        ranks.push(rank);
    }
    ranks
}

pub fn ladder_points(rank: u32) -> u32 {
    (rank as usize)
        .checked_sub(1)
        .and_then(|idx| POINT_LADDER.get(idx))
        .copied()
        .unwrap_or(0)
}

/// Award run points per (gender, scoring class) and fill in totals.
///
/// Entries without a known gender or scoring class get no points.
pub fn assign_points(entries: &mut [ResultEntry]) {
    let mut groups: BTreeMap<(Gender, ScoringClass), Vec<usize>> = BTreeMap::new();
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.run1.points = 0;
        entry.run2.points = 0;
        if let (Some(gender), Some(class)) = (entry.gender, entry.scoring_class()) {
            groups.entry((gender, class)).or_default().push(idx);
        }
    }

    for members in groups.values() {
        for run in [Run::First, Run::Second] {
            let mut timed: Vec<(i64, usize)> = members
                .iter()
                .filter_map(|&idx| run.of(&entries[idx]).time_units.map(|t| (t, idx)))
                .collect();
            timed.sort();
            let times: Vec<i64> = timed.iter().map(|(t, _)| *t).collect();
            for (rank, (_, idx)) in competition_ranks(&times).into_iter().zip(timed) {
                run.of_mut(&mut entries[idx]).points = ladder_points(rank);
            }
        }
    }

    for entry in entries.iter_mut() {
        entry.total_points = entry.run1.points + entry.run2.points;
    }
}

#[derive(Clone, Copy)]
enum Run {
    First,
    Second,
}

impl Run {
    fn of(self, entry: &ResultEntry) -> &RunResult {
        match self {
            Run::First => &entry.run1,
            Run::Second => &entry.run2,
        }
    }

    fn of_mut(self, entry: &mut ResultEntry) -> &mut RunResult {
        match self {
            Run::First => &mut entry.run1,
            Run::Second => &mut entry.run2,
        }
    }
}
