//! Store-backed roster operations.
//!
//! Each mutation loads the whole (race, team) roster, applies the change to a
//! [`TeamRoster`], and writes back only the diff.

use slalom_state::{DocumentStore, PutCondition};
use tracing::{debug, instrument};

use super::team_roster::TeamRoster;
use crate::domain::{Direction, RacerClass, Result, RosterCount, RosterEntry, SlalomError};
use crate::obs;
use crate::repo::Repository;

pub struct RosterService<S> {
    repo: Repository<S>,
}

impl<S> Clone for RosterService<S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<S: DocumentStore> RosterService<S> {
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    async fn load(&self, race_id: &str, team_id: &str) -> Result<TeamRoster> {
        let entries = self.repo.roster(race_id, team_id).await?;
        Ok(TeamRoster::load(race_id, team_id, entries))
    }

    /// Write the diff: inserts, then updates, then deletes.
    async fn persist(&self, roster: &TeamRoster) -> Result<usize> {
        let changes = roster.changes();
        for entry in &changes.inserts {
            self.repo
                .put_roster_entry(entry, PutCondition::MustNotExist)
                .await?;
        }
        for entry in &changes.updates {
            self.repo.put_roster_entry(entry, PutCondition::Always).await?;
        }
        for racer_id in &changes.deletes {
            self.repo
                .delete_roster_entry(roster.race_id(), roster.team_id(), racer_id)
                .await?;
        }
        debug!(writes = changes.len(), "roster persisted");
        Ok(changes.len())
    }

    #[instrument(skip(self), fields(race_id = %race_id, team_id = %team_id))]
    pub async fn roster(&self, race_id: &str, team_id: &str) -> Result<Vec<RosterEntry>> {
        Ok(self.load(race_id, team_id).await?.entries())
    }

    /// Add a directory racer to a race roster. Gender and base class come
    /// from the racer record.
    #[instrument(skip(self), fields(race_id = %race_id, team_id = %team_id, racer_id = %racer_id))]
    pub async fn add(
        &self,
        race_id: &str,
        team_id: &str,
        racer_id: &str,
        desired: Option<RacerClass>,
    ) -> Result<Vec<RosterEntry>> {
        self.repo.unlocked_race(race_id).await?;
        self.repo.team(team_id).await?;
        let racer = self.repo.racer(team_id, racer_id).await?;

        let mut roster = self.load(race_id, team_id).await?;
        roster.add(&racer, desired)?;
        let writes = self.persist(&roster).await?;
        obs::emit_roster_mutated(race_id, team_id, "add", racer_id, writes);
        Ok(roster.entries())
    }

    #[instrument(skip(self), fields(race_id = %race_id, team_id = %team_id, racer_id = %racer_id))]
    pub async fn reclassify(
        &self,
        race_id: &str,
        team_id: &str,
        racer_id: &str,
        class: RacerClass,
    ) -> Result<Vec<RosterEntry>> {
        self.repo.unlocked_race(race_id).await?;
        let mut roster = self.load(race_id, team_id).await?;
        if roster.reclassify(racer_id, class)? {
            let writes = self.persist(&roster).await?;
            obs::emit_roster_mutated(race_id, team_id, "reclassify", racer_id, writes);
        }
        Ok(roster.entries())
    }

    /// Remove an entry. Removing an absent entry returns the roster as is.
    #[instrument(skip(self), fields(race_id = %race_id, team_id = %team_id, racer_id = %racer_id))]
    pub async fn remove(
        &self,
        race_id: &str,
        team_id: &str,
        racer_id: &str,
    ) -> Result<Vec<RosterEntry>> {
        self.repo.unlocked_race(race_id).await?;
        let mut roster = self.load(race_id, team_id).await?;
        if roster.remove(racer_id) {
            let writes = self.persist(&roster).await?;
            obs::emit_roster_mutated(race_id, team_id, "remove", racer_id, writes);
        }
        Ok(roster.entries())
    }

    #[instrument(skip(self), fields(race_id = %race_id, team_id = %team_id, racer_id = %racer_id))]
    pub async fn move_entry(
        &self,
        race_id: &str,
        team_id: &str,
        racer_id: &str,
        direction: Direction,
    ) -> Result<Vec<RosterEntry>> {
        self.repo.unlocked_race(race_id).await?;
        let mut roster = self.load(race_id, team_id).await?;
        let transition = roster.move_entry(racer_id, direction)?;
        debug!(?transition, "move planned");
        if !transition.is_stay() {
            let writes = self.persist(&roster).await?;
            obs::emit_roster_mutated(race_id, team_id, "move", racer_id, writes);
        }
        Ok(roster.entries())
    }

    /// Replace `dest_race`'s roster for a team with a copy of `source_race`'s.
    #[instrument(skip(self), fields(team_id = %team_id))]
    pub async fn copy(
        &self,
        source_race: &str,
        dest_race: &str,
        team_id: &str,
    ) -> Result<Vec<RosterEntry>> {
        if source_race == dest_race {
            return Err(SlalomError::Validation(
                "cannot copy a roster onto its own race".to_string(),
            ));
        }
        self.repo.race(source_race).await?;
        self.repo.unlocked_race(dest_race).await?;

        let source = self.repo.roster(source_race, team_id).await?;
        let mut dest = self.load(dest_race, team_id).await?;
        let dropped = dest.replace_from(&source);
        if !dropped.is_empty() {
            debug!(?dropped, "over-cap entries left out of copy");
        }
        self.persist(&dest).await?;
        obs::emit_roster_copied(source_race, dest_race, team_id, dest.len(), dropped.len());
        Ok(dest.entries())
    }

    /// Non-DNS entry counts for every (race, team) pair.
    #[instrument(
        skip(self, race_ids, team_ids),
        fields(races = race_ids.len(), teams = team_ids.len())
    )]
    pub async fn counts(
        &self,
        race_ids: &[String],
        team_ids: &[String],
    ) -> Result<Vec<RosterCount>> {
        let mut out = Vec::with_capacity(race_ids.len() * team_ids.len());
        for race_id in race_ids {
            for team_id in team_ids {
                out.push(self.load(race_id, team_id).await?.count());
            }
        }
        Ok(out)
    }
}
