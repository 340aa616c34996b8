//! Lifecycle events for races, rosters, start lists and results.
//!
//! Every event is an `info!` (or `warn!`) record with an `event` field, so a
//! JSON log stream can be filtered on `event = "roster.mutated"` and friends.

use tracing::{info, warn};

use crate::results::model::ReconciliationIssue;

/// RAII guard that tags everything logged while it lives with a race id.
///
/// Holds an entered span, so keep it out of `.await` points.
pub struct RaceSpan {
    _span: tracing::span::EnteredSpan,
}

impl RaceSpan {
    pub fn enter(race_id: &str) -> Self {
        let span = tracing::info_span!("slalom.race", race_id = %race_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// A roster mutation was persisted.
pub fn emit_roster_mutated(race_id: &str, team_id: &str, op: &str, racer_id: &str, writes: usize) {
    info!(
        event = "roster.mutated",
        race_id = %race_id,
        team_id = %team_id,
        op = %op,
        racer_id = %racer_id,
        writes = writes,
    );
}

pub fn emit_roster_copied(source: &str, dest: &str, team_id: &str, copied: usize, dropped: usize) {
    info!(
        event = "roster.copied",
        source_race = %source,
        dest_race = %dest,
        team_id = %team_id,
        copied = copied,
        dropped = dropped,
    );
}

pub fn emit_start_list_generated(race_id: &str, female: usize, male: usize, excluded: usize) {
    info!(
        event = "start_list.generated",
        race_id = %race_id,
        female = female,
        male = male,
        excluded = excluded,
    );
}

pub fn emit_start_list_copied(source: &str, dest: &str, entries: usize) {
    info!(
        event = "start_list.copied",
        source_race = %source,
        dest_race = %dest,
        entries = entries,
    );
}

/// Results were recomputed and stored.
pub fn emit_results_submitted(race_id: &str, competitors: usize, issues: usize, teams: usize) {
    info!(
        event = "results.submitted",
        race_id = %race_id,
        competitors = competitors,
        issues = issues,
        teams = teams,
    );
}

/// One reconciliation finding (warning level; never fatal).
pub fn emit_results_issue(race_id: &str, issue: &ReconciliationIssue) {
    warn!(
        event = "results.issue",
        race_id = %race_id,
        bib = issue.bib,
        message = %issue.message,
    );
}

pub fn emit_race_locked(race_id: &str, locked: bool) {
    info!(event = "race.locked", race_id = %race_id, locked = locked);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn race_span_enters() {
        let _span = RaceSpan::enter("race-1");
        emit_race_locked("race-1", true);
    }
}
