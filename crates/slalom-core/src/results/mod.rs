//! Results scoring engine.
//!
//! A submission flows through [`timing`] (raw runs), [`reconcile`] (start-list
//! identity), [`placement`] (ladder points) and [`team`] (league team totals
//! and display groups), then replaces the stored result set.

pub mod model;
pub mod placement;
pub mod reconcile;
pub mod service;
pub mod team;
pub mod timing;

pub use model::{
    IssueKind, RaceResults, ReconciliationIssue, ResultEntry, ResultGroup, ResultSummary,
    RunResult, TeamScore,
};
pub use service::{score, ResultsService, Scored};
pub use timing::{RawCompetitor, RawRun};
