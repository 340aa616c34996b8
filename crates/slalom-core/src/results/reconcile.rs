//! Match timing blocks against the start list.

use std::collections::{HashMap, HashSet};

use super::model::{IssueKind, ReconciliationIssue, ResultEntry};
use super::timing::{parse_run, RawCompetitor};
use crate::config::{BibPlan, TimeUnit};
use crate::domain::{RacerClass, Team};
use crate::repo::META_BIB;
use crate::start_list::StartListEntry;

/// Fold a name for comparison: "Smith, Jane" and "jane smith" match.
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    let flipped = match trimmed.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
        None => trimmed.to_string(),
    };
    flipped
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    /// Sorted by bib.
    pub entries: Vec<ResultEntry>,
    pub issues: Vec<ReconciliationIssue>,
}

pub struct ReconcileInput<'a> {
    pub race_id: &'a str,
    pub start_list: &'a [StartListEntry],
    pub teams: &'a [Team],
    pub bibs: BibPlan,
    pub time_unit: TimeUnit,
}

/// Build one result entry per distinct bib. Findings never stop the pass.
pub fn reconcile(input: &ReconcileInput<'_>, raw: &[RawCompetitor]) -> Reconciled {
    let by_bib: HashMap<u32, &StartListEntry> =
        input.start_list.iter().map(|e| (e.bib, e)).collect();
    let teams_by_name: HashMap<String, &Team> = input
        .teams
        .iter()
        .map(|t| (t.name.trim().to_lowercase(), t))
        .collect();

    let mut out = Reconciled::default();
    let mut seen = HashSet::new();
    for block in raw {
        let bib = block.bib;
        if bib == META_BIB {
            out.issues.push(issue(bib, IssueKind::UnknownBib, "bib 0 is reserved; block ignored"));
            continue;
        }
        if !seen.insert(bib) {
            out.issues.push(issue(
                bib,
                IssueKind::DuplicateBib,
                format!("bib {bib} appears more than once; later block ignored"),
            ));
            continue;
        }

        let run1 = parse_run(&block.run1, input.time_unit);
        let run2 = parse_run(&block.run2, input.time_unit);
        let entry = match by_bib.get(&bib) {
            Some(start) => {
                if !block.name.trim().is_empty()
                    && normalize_name(&block.name) != normalize_name(&start.racer_name)
                {
                    out.issues.push(issue(
                        bib,
                        IssueKind::NameMismatch {
                            expected: start.racer_name.clone(),
                            found: block.name.clone(),
                        },
                        format!(
                            "bib {bib} is {} on the start list but {} in timing",
                            start.racer_name, block.name
                        ),
                    ));
                }
                ResultEntry {
                    race_id: input.race_id.to_string(),
                    bib,
                    racer_id: Some(start.racer_id.clone()),
                    name: start.racer_name.clone(),
                    team_id: Some(start.team_id.clone()),
                    team_name: start.team_name.clone(),
                    gender: Some(start.gender),
                    class: Some(start.class),
                    class_label: block.class.clone(),
                    verified: true,
                    run1,
                    run2,
                    total_points: 0,
                }
            }
            None => {
                out.issues.push(issue(
                    bib,
                    IssueKind::UnknownBib,
                    format!("bib {bib} ({}) is not on the start list", block.name.trim()),
                ));
                let class = match block.class.parse::<RacerClass>() {
                    Ok(class) if !class.is_dns() => Some(class),
                    _ => {
                        out.issues.push(issue(
                            bib,
                            IssueKind::UnknownClass {
                                label: block.class.clone(),
                            },
                            format!("bib {bib} has unrecognised class {:?}", block.class),
                        ));
                        None
                    }
                };
                let team = teams_by_name.get(&block.team.trim().to_lowercase());
                ResultEntry {
                    race_id: input.race_id.to_string(),
                    bib,
                    racer_id: None,
                    name: block.name.trim().to_string(),
                    team_id: team.map(|t| t.id.clone()),
                    team_name: team
                        .map_or_else(|| block.team.trim().to_string(), |t| t.name.clone()),
                    gender: input.bibs.gender_of(bib),
                    class,
                    class_label: block.class.clone(),
                    verified: false,
                    run1,
                    run2,
                    total_points: 0,
                }
            }
        };
        out.entries.push(entry);
    }
    out.entries.sort_by_key(|e| e.bib);
    out
}

fn issue(bib: u32, kind: IssueKind, message: impl Into<String>) -> ReconciliationIssue {
    ReconciliationIssue {
        bib,
        kind,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;
    use crate::results::timing::RawRun;

    #[test]
    fn names_fold_order_case_and_punctuation() {
        assert_eq!(normalize_name("Smith, Jane"), "jane smith");
        assert_eq!(normalize_name("  jane   SMITH "), "jane smith");
        assert_eq!(normalize_name("O'Brien, Mary-Kate"), "marykate obrien");
        assert_eq!(normalize_name(""), "");
    }

    fn start(bib: u32, name: &str) -> StartListEntry {
        StartListEntry {
            race_id: "r1".to_string(),
            bib,
            racer_id: format!("racer-{bib}"),
            racer_name: name.to_string(),
            team_id: "north".to_string(),
            team_name: "North".to_string(),
            gender: Gender::Female,
            class: RacerClass::VarsityAlternate,
            seed: 1,
        }
    }

    fn block(bib: u32, name: &str, team: &str, class: &str) -> RawCompetitor {
        RawCompetitor {
            bib,
            name: name.to_string(),
            team: team.to_string(),
            class: class.to_string(),
            run1: RawRun {
                status: 1,
                start: 1_000,
                finish: 2_000,
            },
            run2: RawRun::default(),
        }
    }

    fn input<'a>(start_list: &'a [StartListEntry], teams: &'a [Team]) -> ReconcileInput<'a> {
        ReconcileInput {
            race_id: "r1",
            start_list,
            teams,
            bibs: BibPlan::default(),
            time_unit: TimeUnit::Microseconds,
        }
    }

    #[test]
    fn matched_bib_adopts_start_list_identity() {
        let list = vec![start(3, "Jane Smith")];
        let out = reconcile(&input(&list, &[]), &[block(3, "Smith, Jane", "??", "V")]);
        assert!(out.issues.is_empty());
        let e = &out.entries[0];
        assert!(e.verified);
        assert_eq!(e.class, Some(RacerClass::VarsityAlternate));
        assert_eq!(e.team_id.as_deref(), Some("north"));
        assert_eq!(e.class_label, "V");
    }

    #[test]
    fn name_mismatch_is_flagged_not_fatal() {
        let list = vec![start(3, "Jane Smith")];
        let out = reconcile(&input(&list, &[]), &[block(3, "Janet Smythe", "", "V")]);
        assert_eq!(out.entries.len(), 1);
        assert!(matches!(out.issues[0].kind, IssueKind::NameMismatch { .. }));
    }

    #[test]
    fn unknown_bib_keeps_raw_identity() {
        let teams = vec![Team {
            id: "south".to_string(),
            name: "South Ridge".to_string(),
            non_league: false,
        }];
        let out = reconcile(
            &input(&[], &teams),
            &[
                block(104, "Doe, John", "south ridge", "JV"),
                block(5, "Nobody", "Elsewhere", "coach"),
            ],
        );
        assert_eq!(out.entries.len(), 2);
        let jv = &out.entries[1];
        assert_eq!(jv.bib, 104);
        assert!(!jv.verified);
        assert_eq!(jv.gender, Some(Gender::Male));
        assert_eq!(jv.team_id.as_deref(), Some("south"));
        assert_eq!(jv.class, Some(RacerClass::JrVarsity));

        let odd = &out.entries[0];
        assert_eq!(odd.class, None);
        assert_eq!(odd.team_id, None);
        assert_eq!(odd.team_name, "Elsewhere");
        assert!(out
            .issues
            .iter()
            .any(|i| matches!(&i.kind, IssueKind::UnknownClass { label } if label == "coach")));
    }

    #[test]
    fn duplicate_bib_keeps_first_block() {
        let list = vec![start(3, "Jane Smith")];
        let mut second = block(3, "Jane Smith", "", "V");
        second.run1.finish = 9_000;
        let out = reconcile(&input(&list, &[]), &[block(3, "Jane Smith", "", "V"), second]);
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].run1.time_units, Some(1_000));
        assert_eq!(out.issues[0].kind, IssueKind::DuplicateBib);
    }
}
