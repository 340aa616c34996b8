//! Results scoring pipeline and the service that stores each submission.

use chrono::Utc;
use slalom_state::DocumentStore;
use tracing::{debug, instrument};

use super::model::{RaceResults, ReconciliationIssue, ResultEntry, ResultSummary, TeamScore};
use super::placement::assign_points;
use super::reconcile::{reconcile, ReconcileInput};
use super::team::{display_groups, team_scores};
use super::timing::RawCompetitor;
use crate::config::{BibPlan, TimeUnit};
use crate::domain::{Result, Team};
use crate::obs;
use crate::repo::Repository;
use crate::start_list::StartListEntry;

/// Output of one scoring pass, before persistence.
#[derive(Debug, Clone)]
pub struct Scored {
    pub entries: Vec<ResultEntry>,
    pub issues: Vec<ReconciliationIssue>,
    pub team_scores: Vec<TeamScore>,
}

/// Reconcile, place and team-score a timing export.
pub fn score(
    race_id: &str,
    raw: &[RawCompetitor],
    start_list: &[StartListEntry],
    teams: &[Team],
    bibs: BibPlan,
    time_unit: TimeUnit,
) -> Scored {
    let _span = obs::RaceSpan::enter(race_id);
    let mut reconciled = reconcile(
        &ReconcileInput {
            race_id,
            start_list,
            teams,
            bibs,
            time_unit,
        },
        raw,
    );
    debug!(
        competitors = reconciled.entries.len(),
        issues = reconciled.issues.len(),
        "timing reconciled"
    );
    assign_points(&mut reconciled.entries);
    let team_scores = team_scores(race_id, &reconciled.entries, teams, time_unit);
    Scored {
        entries: reconciled.entries,
        issues: reconciled.issues,
        team_scores,
    }
}

pub struct ResultsService<S> {
    repo: Repository<S>,
    bibs: BibPlan,
    time_unit: TimeUnit,
}

impl<S> Clone for ResultsService<S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            bibs: self.bibs,
            time_unit: self.time_unit,
        }
    }
}

impl<S: DocumentStore> ResultsService<S> {
    pub fn new(repo: Repository<S>, bibs: BibPlan, time_unit: TimeUnit) -> Self {
        Self {
            repo,
            bibs,
            time_unit,
        }
    }

    /// Stored results. A race with no submission yields an empty set.
    #[instrument(skip(self), fields(race_id = %race_id))]
    pub async fn results(&self, race_id: &str) -> Result<RaceResults> {
        self.repo.race(race_id).await?;
        let (summary, mut entries) = self.repo.results(race_id).await?;
        entries.sort_by_key(|e| e.bib);
        let teams = self.repo.teams().await?;
        let groups = display_groups(&entries, &teams);
        let (submitted_at, issues, team_scores) = match summary {
            Some(s) => (Some(s.submitted_at), s.issues, s.team_scores),
            None => (None, Vec::new(), Vec::new()),
        };
        Ok(RaceResults {
            race_id: race_id.to_string(),
            submitted_at,
            entries,
            issues,
            team_scores,
            groups,
        })
    }

    /// Score a timing export and replace whatever was stored before.
    #[instrument(skip(self, raw), fields(race_id = %race_id, competitors = raw.len()))]
    pub async fn submit(&self, race_id: &str, raw: &[RawCompetitor]) -> Result<RaceResults> {
        self.repo.unlocked_race(race_id).await?;
        let (_, start_list) = self.repo.start_list(race_id).await?;
        let teams = self.repo.teams().await?;

        let scored = score(race_id, raw, &start_list, &teams, self.bibs, self.time_unit);
        for issue in &scored.issues {
            obs::emit_results_issue(race_id, issue);
        }

        let summary = ResultSummary {
            race_id: race_id.to_string(),
            submitted_at: Utc::now(),
            issues: scored.issues,
            team_scores: scored.team_scores,
        };
        self.repo.replace_results(&summary, &scored.entries).await?;
        obs::emit_results_submitted(
            race_id,
            scored.entries.len(),
            summary.issues.len(),
            summary.team_scores.len(),
        );

        let groups = display_groups(&scored.entries, &teams);
        Ok(RaceResults {
            race_id: race_id.to_string(),
            submitted_at: Some(summary.submitted_at),
            entries: scored.entries,
            issues: summary.issues,
            team_scores: summary.team_scores,
            groups,
        })
    }
}
