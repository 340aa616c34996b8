//! League team scoring and display groups.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::model::{ResultEntry, ResultGroup, TeamScore};
use super::placement::competition_ranks;
use crate::config::TimeUnit;
use crate::domain::{Gender, ScoringClass, Team};

/// Scoring times counted per team per run.
pub const COUNTING_RUNS: usize = 3;

/// Sum of the three fastest completed times, if there are three.
fn run_total(mut times: Vec<i64>) -> (Vec<i64>, Option<i64>) {
    times.sort_unstable();
    times.truncate(COUNTING_RUNS);
    let total = (times.len() == COUNTING_RUNS).then(|| times.iter().sum());
    (times, total)
}

/// Team points for a rank given the number of full teams.
pub fn team_points(rank: u32, full_teams: usize) -> u32 {
    let full = 2 * full_teams as i64;
    (full - 2 * (rank as i64 - 1)).max(0) as u32
}

/// Team scores for league teams, Female first, then by rank.
///
/// Only Varsity-scoring entries of known league teams count. Teams whose
/// combined total is undefined are listed last with no rank and 0 points.
pub fn team_scores(
    race_id: &str,
    entries: &[ResultEntry],
    teams: &[Team],
    unit: TimeUnit,
) -> Vec<TeamScore> {
    let league: HashMap<&str, &Team> = teams
        .iter()
        .filter(|t| !t.non_league)
        .map(|t| (t.id.as_str(), t))
        .collect();

    let mut by_team: BTreeMap<(Gender, &str), Vec<&ResultEntry>> = BTreeMap::new();
    for entry in entries {
        let (Some(gender), Some(team_id)) = (entry.gender, entry.team_id.as_deref()) else {
            continue;
        };
        if entry.scoring_class() == Some(ScoringClass::Varsity) && league.contains_key(team_id) {
            by_team.entry((gender, team_id)).or_default().push(entry);
        }
    }

    let mut out = Vec::new();
    for gender in Gender::ALL {
        let members: Vec<(&str, &Vec<&ResultEntry>)> = by_team
            .iter()
            .filter(|((g, _), _)| *g == gender)
            .map(|((_, team_id), racers)| (*team_id, racers))
            .collect();
        let full_teams = members
            .iter()
            .filter(|(_, racers)| racers.len() >= COUNTING_RUNS)
            .count();

        let mut scored: Vec<(Option<i64>, TeamScore)> = members
            .into_iter()
            .map(|(team_id, racers)| {
                let (run1, run1_total) =
                    run_total(racers.iter().filter_map(|e| e.run1.time_units).collect());
                let (run2, run2_total) =
                    run_total(racers.iter().filter_map(|e| e.run2.time_units).collect());
                let combined = run1_total.zip(run2_total).map(|(a, b)| a + b);
                let seconds = |units: Vec<i64>| -> Vec<f64> {
                    units.into_iter().map(|u| unit.to_seconds(u)).collect()
                };
                let score = TeamScore {
                    race_id: race_id.to_string(),
                    gender,
                    team_id: team_id.to_string(),
                    team_name: league
                        .get(team_id)
                        .map_or_else(|| team_id.to_string(), |t| t.name.clone()),
                    run1_times: seconds(run1),
                    run2_times: seconds(run2),
                    run1_total: run1_total.map(|u| unit.to_seconds(u)),
                    run2_total: run2_total.map(|u| unit.to_seconds(u)),
                    combined_total: combined.map(|u| unit.to_seconds(u)),
                    rank: None,
                    points: 0,
                };
                (combined, score)
            })
            .collect();

        scored.sort_by(|(a, sa), (b, sb)| {
            let by_total = match (a, b) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_total.then_with(|| sa.team_name.cmp(&sb.team_name))
        });

        let defined: Vec<i64> = scored.iter().filter_map(|(total, _)| *total).collect();
        let ranks = competition_ranks(&defined);
        for ((_, score), rank) in scored.iter_mut().zip(ranks) {
            score.rank = Some(rank);
            score.points = team_points(rank, full_teams);
        }
        out.extend(scored.into_iter().map(|(_, score)| score));
    }
    out
}

/// Display groups in fixed order. Non-league entries are left out; entries
/// of unknown teams stay in.
pub fn display_groups(entries: &[ResultEntry], teams: &[Team]) -> Vec<ResultGroup> {
    const ORDER: [ScoringClass; 3] = [
        ScoringClass::Varsity,
        ScoringClass::JrVarsity,
        ScoringClass::Provisional,
    ];
    let non_league: HashSet<&str> = teams
        .iter()
        .filter(|t| t.non_league)
        .map(|t| t.id.as_str())
        .collect();

    let mut groups = Vec::with_capacity(ORDER.len() * Gender::ALL.len());
    for class in ORDER {
        for gender in Gender::ALL {
            let mut members: Vec<ResultEntry> = entries
                .iter()
                .filter(|e| e.gender == Some(gender) && e.scoring_class() == Some(class))
                .filter(|e| {
                    e.team_id
                        .as_deref()
                        .map_or(true, |id| !non_league.contains(id))
                })
                .cloned()
                .collect();
            members.sort_by(|a, b| b.total_points.cmp(&a.total_points).then(a.bib.cmp(&b.bib)));
            groups.push(ResultGroup {
                label: format!("{} {}", gender.label(), class.label()),
                gender,
                class,
                entries: members,
            });
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RacerClass;
    use crate::results::model::RunResult;

    fn run(t: Option<f64>) -> RunResult {
        let units = t.map(|s| (s * 1_000_000.0) as i64);
        RunResult {
            status: if t.is_some() { 1 } else { 2 },
            time_units: units,
            time: t,
            points: 0,
        }
    }

    fn entry(bib: u32, team: &str, run1: Option<f64>, run2: Option<f64>) -> ResultEntry {
        ResultEntry {
            race_id: "r1".to_string(),
            bib,
            racer_id: Some(format!("racer-{bib}")),
            name: format!("Racer {bib}"),
            team_id: Some(team.to_string()),
            team_name: team.to_string(),
            gender: Some(Gender::Female),
            class: Some(RacerClass::Varsity),
            class_label: "V".to_string(),
            verified: true,
            run1: run(run1),
            run2: run(run2),
            total_points: 0,
        }
    }

    fn team(id: &str, non_league: bool) -> Team {
        Team {
            id: id.to_string(),
            name: id.to_uppercase(),
            non_league,
        }
    }

    #[test]
    fn points_formula() {
        assert_eq!(team_points(1, 4), 8);
        assert_eq!(team_points(4, 4), 2);
        assert_eq!(team_points(5, 4), 0);
        assert_eq!(team_points(9, 2), 0);
    }

    #[test]
    fn incomplete_second_run_scores_zero() {
        let entries = vec![
            entry(1, "a", Some(60.0), Some(60.0)),
            entry(2, "a", Some(61.0), Some(61.0)),
            entry(3, "a", Some(62.0), None),
            entry(4, "b", Some(63.0), Some(63.0)),
            entry(5, "b", Some(64.0), Some(64.0)),
            entry(6, "b", Some(65.0), Some(65.0)),
        ];
        let teams = [team("a", false), team("b", false)];
        let scores = team_scores("r1", &entries, &teams, TimeUnit::Microseconds);
        assert_eq!(scores.len(), 2);

        let b = &scores[0];
        assert_eq!(b.team_id, "b");
        assert_eq!(b.rank, Some(1));
        assert_eq!(b.points, 4);
        assert_eq!(b.combined_total, Some(384.0));

        let a = &scores[1];
        assert_eq!(a.run1_total, Some(183.0));
        assert_eq!(a.run2_total, None);
        assert_eq!(a.combined_total, None);
        assert_eq!(a.rank, None);
        assert_eq!(a.points, 0);
    }

    #[test]
    fn non_league_and_junior_entries_do_not_count() {
        let mut jv = entry(7, "a", Some(10.0), Some(10.0));
        jv.class = Some(RacerClass::JrVarsity);
        let entries = vec![
            entry(1, "guest", Some(50.0), Some(50.0)),
            entry(2, "guest", Some(50.0), Some(50.0)),
            entry(3, "guest", Some(50.0), Some(50.0)),
            jv,
        ];
        let teams = [team("a", false), team("guest", true)];
        let scores = team_scores("r1", &entries, &teams, TimeUnit::Microseconds);
        assert!(scores.is_empty());
    }

    #[test]
    fn groups_are_fixed_and_sorted() {
        let mut entries = vec![
            entry(3, "a", None, None),
            entry(1, "a", None, None),
            entry(2, "guest", None, None),
        ];
        entries[0].total_points = 80;
        entries[1].total_points = 80;
        let mut orphan = entry(4, "x", None, None);
        orphan.team_id = None;
        orphan.total_points = 100;
        entries.push(orphan);

        let groups = display_groups(&entries, &[team("a", false), team("guest", true)]);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Female Varsity",
                "Male Varsity",
                "Female Jr Varsity",
                "Male Jr Varsity",
                "Female Provisional",
                "Male Provisional"
            ]
        );
        let bibs: Vec<u32> = groups[0].entries.iter().map(|e| e.bib).collect();
        assert_eq!(bibs, vec![4, 1, 3]);
    }
}
