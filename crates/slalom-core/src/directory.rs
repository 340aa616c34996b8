//! Team and racer directory consumed by the engines.

use slalom_state::DocumentStore;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Gender, Racer, RacerClass, Result, SlalomError, Team};
use crate::repo::Repository;

pub struct DirectoryService<S> {
    repo: Repository<S>,
}

impl<S> Clone for DirectoryService<S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<S: DocumentStore> DirectoryService<S> {
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    /// Register (or rename) a team under a caller-chosen id.
    #[instrument(skip(self))]
    pub async fn register_team(&self, id: &str, name: &str, non_league: bool) -> Result<Team> {
        let id = id.trim();
        if id.is_empty() || id.contains('#') {
            return Err(SlalomError::Validation(format!("invalid team id: {id:?}")));
        }
        if name.trim().is_empty() {
            return Err(SlalomError::Validation("team name is empty".to_string()));
        }
        let team = Team {
            id: id.to_string(),
            name: name.trim().to_string(),
            non_league,
        };
        self.repo.put_team(&team).await?;
        info!(team_id = %team.id, non_league, "team registered");
        Ok(team)
    }

    #[instrument(skip(self))]
    pub async fn register_racer(
        &self,
        team_id: &str,
        name: &str,
        gender: Gender,
        base_class: RacerClass,
    ) -> Result<Racer> {
        if base_class.is_dns() {
            return Err(SlalomError::Validation(
                "DNS is a race-day class, not a base class".to_string(),
            ));
        }
        if name.trim().is_empty() {
            return Err(SlalomError::Validation("racer name is empty".to_string()));
        }
        self.repo.team(team_id).await?;
        let racer = Racer {
            id: Uuid::new_v4().to_string(),
            team_id: team_id.to_string(),
            name: name.trim().to_string(),
            gender,
            base_class,
        };
        self.repo.put_racer(&racer).await?;
        info!(racer_id = %racer.id, team_id, "racer registered");
        Ok(racer)
    }

    pub async fn team(&self, team_id: &str) -> Result<Team> {
        self.repo.team(team_id).await
    }

    /// Teams by name.
    pub async fn teams(&self) -> Result<Vec<Team>> {
        let mut teams = self.repo.teams().await?;
        teams.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(teams)
    }

    pub async fn racer(&self, team_id: &str, racer_id: &str) -> Result<Racer> {
        self.repo.racer(team_id, racer_id).await
    }

    /// A team's racers by gender, then name.
    pub async fn racers(&self, team_id: &str) -> Result<Vec<Racer>> {
        self.repo.team(team_id).await?;
        let mut racers = self.repo.racers(team_id).await?;
        racers.sort_by(|a, b| (a.gender, &a.name).cmp(&(b.gender, &b.name)));
        Ok(racers)
    }
}
