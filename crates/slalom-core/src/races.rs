//! Race records: creation, lookup, locking and cascading delete.

use chrono::{NaiveDate, Utc};
use slalom_state::DocumentStore;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Race, Result, SlalomError};
use crate::obs;
use crate::repo::Repository;

pub struct RaceService<S> {
    repo: Repository<S>,
}

impl<S> Clone for RaceService<S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<S: DocumentStore> RaceService<S> {
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        name: &str,
        venue: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<Race> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SlalomError::Validation("race name is empty".to_string()));
        }
        let race = Race {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            venue: venue.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string),
            date,
            locked: false,
            created_at: Utc::now(),
        };
        self.repo.put_race(&race).await?;
        info!(race_id = %race.id, "race created");
        Ok(race)
    }

    pub async fn get(&self, race_id: &str) -> Result<Race> {
        self.repo.race(race_id).await
    }

    /// All races, by date (undated last) then creation time.
    pub async fn list(&self) -> Result<Vec<Race>> {
        let mut races = self.repo.races().await?;
        races.sort_by(|a, b| {
            (a.date.is_none(), a.date, a.created_at).cmp(&(b.date.is_none(), b.date, b.created_at))
        });
        Ok(races)
    }

    /// Lock or unlock a race. Always allowed.
    #[instrument(skip(self), fields(race_id = %race_id))]
    pub async fn set_locked(&self, race_id: &str, locked: bool) -> Result<Race> {
        let mut race = self.repo.race(race_id).await?;
        if race.locked != locked {
            race.locked = locked;
            self.repo.put_race(&race).await?;
        }
        obs::emit_race_locked(race_id, locked);
        Ok(race)
    }

    /// Delete a race with its rosters, start list and results. The race must
    /// be unlocked.
    #[instrument(skip(self), fields(race_id = %race_id))]
    pub async fn delete(&self, race_id: &str) -> Result<Race> {
        let race = self.repo.unlocked_race(race_id).await?;
        let mut removed = 0;
        for team in self.repo.teams().await? {
            removed += self.repo.clear_roster(race_id, &team.id).await?;
        }
        removed += self.repo.clear_start_list(race_id).await?;
        removed += self.repo.clear_results(race_id).await?;
        self.repo.delete_race(race_id).await?;
        info!(removed, "race deleted");
        Ok(race)
    }
}
