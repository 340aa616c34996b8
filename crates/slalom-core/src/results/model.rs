//! Scored result records, team scores and display groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Gender, RacerClass, ScoringClass};

/// One run of one competitor after parsing and scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Raw status code from the timing data (1 = finished).
    pub status: i32,
    /// Elapsed time in timing units; `None` when the run is unscored.
    pub time_units: Option<i64>,
    /// Elapsed time in seconds; `None` when the run is unscored.
    pub time: Option<f64>,
    pub points: u32,
}

impl RunResult {
    pub fn completed(&self) -> bool {
        self.time_units.is_some()
    }
}

/// Per-competitor result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub race_id: String,
    pub bib: u32,
    pub racer_id: Option<String>,
    pub name: String,
    pub team_id: Option<String>,
    pub team_name: String,
    pub gender: Option<Gender>,
    /// Reported class. Varsity Alternate is preserved here.
    pub class: Option<RacerClass>,
    /// Class label exactly as it appeared in the timing data.
    pub class_label: String,
    /// Whether identity came from the start list.
    pub verified: bool,
    pub run1: RunResult,
    pub run2: RunResult,
    pub total_points: u32,
}

impl ResultEntry {
    pub fn scoring_class(&self) -> Option<ScoringClass> {
        self.class.and_then(|c| c.scoring_class())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    UnknownBib,
    NameMismatch { expected: String, found: String },
    UnknownClass { label: String },
    DuplicateBib,
}

/// Non-fatal reconciliation finding. Never aborts scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationIssue {
    pub bib: u32,
    #[serde(flatten)]
    pub kind: IssueKind,
    pub message: String,
}

/// Team result for one gender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub race_id: String,
    pub gender: Gender,
    pub team_id: String,
    pub team_name: String,
    /// The (up to) three fastest completed run-1 times, ascending.
    pub run1_times: Vec<f64>,
    pub run2_times: Vec<f64>,
    pub run1_total: Option<f64>,
    pub run2_total: Option<f64>,
    pub combined_total: Option<f64>,
    pub rank: Option<u32>,
    pub points: u32,
}

/// Summary record stored under bib 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub race_id: String,
    pub submitted_at: DateTime<Utc>,
    pub issues: Vec<ReconciliationIssue>,
    /// League teams only.
    pub team_scores: Vec<TeamScore>,
}

/// Fixed display group, e.g. "Female Varsity".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultGroup {
    pub label: String,
    pub gender: Gender,
    pub class: ScoringClass,
    /// Total points descending, then bib ascending.
    pub entries: Vec<ResultEntry>,
}

/// Snapshot returned by every results operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResults {
    pub race_id: String,
    pub submitted_at: Option<DateTime<Utc>>,
    /// Every competitor, unfiltered, by bib.
    pub entries: Vec<ResultEntry>,
    pub issues: Vec<ReconciliationIssue>,
    pub team_scores: Vec<TeamScore>,
    pub groups: Vec<ResultGroup>,
}
