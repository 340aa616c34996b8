//! Start-list service: fetch, exclusions, generation and copy over the store.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slalom_state::DocumentStore;
use tracing::{debug, instrument};

use super::model::{StartList, StartListMeta};
use super::seeding::{self, SeedingInput};
use crate::config::BibPlan;
use crate::domain::{Gender, Result, SlalomError};
use crate::obs;
use crate::repo::Repository;

pub struct StartListService<S> {
    repo: Repository<S>,
    bibs: BibPlan,
}

impl<S> Clone for StartListService<S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            bibs: self.bibs,
        }
    }
}

impl<S: DocumentStore> StartListService<S> {
    pub fn new(repo: Repository<S>, bibs: BibPlan) -> Self {
        Self { repo, bibs }
    }

    async fn snapshot(&self, race_id: &str) -> Result<StartList> {
        let (meta, mut entries) = self.repo.start_list(race_id).await?;
        entries.sort_by_key(|e| e.bib);
        Ok(StartList {
            race_id: race_id.to_string(),
            meta: meta.unwrap_or_else(|| StartListMeta::empty(race_id)),
            entries,
        })
    }

    #[instrument(skip(self), fields(race_id = %race_id))]
    pub async fn start_list(&self, race_id: &str) -> Result<StartList> {
        self.repo.race(race_id).await?;
        self.snapshot(race_id).await
    }

    #[instrument(skip(self), fields(race_id = %race_id))]
    pub async fn exclusions(&self, race_id: &str) -> Result<Vec<u32>> {
        Ok(self.start_list(race_id).await?.meta.excluded_bibs)
    }

    /// Replace the excluded-bib list. Entries and draw orders are kept; the
    /// new list applies from the next generation.
    #[instrument(skip(self, bibs), fields(race_id = %race_id))]
    pub async fn set_exclusions(&self, race_id: &str, mut bibs: Vec<u32>) -> Result<StartList> {
        self.repo.unlocked_race(race_id).await?;
        if bibs.contains(&0) {
            return Err(SlalomError::Validation(
                "bib 0 is reserved and cannot be excluded".to_string(),
            ));
        }
        bibs.sort_unstable();
        bibs.dedup();

        let mut list = self.snapshot(race_id).await?;
        list.meta.excluded_bibs = bibs;
        self.repo.put_start_list_meta(&list.meta).await?;
        debug!(excluded = list.meta.excluded_bibs.len(), "exclusions stored");
        Ok(list)
    }

    /// Generate with an entropy-seeded draw for new teams.
    pub async fn generate(&self, race_id: &str) -> Result<StartList> {
        let mut rng = StdRng::from_entropy();
        self.generate_with_rng(race_id, &mut rng).await
    }

    /// Generate using the supplied random source for new teams' draw order.
    #[instrument(skip(self, rng), fields(race_id = %race_id))]
    pub async fn generate_with_rng<R>(&self, race_id: &str, rng: &mut R) -> Result<StartList>
    where
        R: Rng + Send + ?Sized,
    {
        self.repo.unlocked_race(race_id).await?;
        let teams = self.repo.teams().await?;
        let mut roster = Vec::new();
        for team in &teams {
            roster.extend(self.repo.roster(race_id, &team.id).await?);
        }
        let (previous, _) = self.repo.start_list(race_id).await?;

        let (meta, entries) = seeding::build(
            SeedingInput {
                race_id,
                roster: &roster,
                teams: &teams,
                previous: previous.as_ref(),
                bibs: self.bibs,
            },
            rng,
        )?;
        self.repo.replace_start_list(&meta, &entries).await?;

        let count = |g: Gender| entries.iter().filter(|e| e.gender == g).count();
        obs::emit_start_list_generated(
            race_id,
            count(Gender::Female),
            count(Gender::Male),
            meta.excluded_bibs.len(),
        );
        Ok(StartList {
            race_id: race_id.to_string(),
            meta,
            entries,
        })
    }

    /// Clone another race's start list: entries, exclusions and draw orders.
    #[instrument(skip(self))]
    pub async fn copy(&self, source_race: &str, dest_race: &str) -> Result<StartList> {
        if source_race == dest_race {
            return Err(SlalomError::Validation(
                "cannot copy a start list onto its own race".to_string(),
            ));
        }
        self.repo.race(source_race).await?;
        self.repo.unlocked_race(dest_race).await?;

        let source = self.snapshot(source_race).await?;
        if source.is_empty() {
            return Err(SlalomError::Validation(format!(
                "race {source_race} has no start list to copy"
            )));
        }

        let meta = StartListMeta {
            race_id: dest_race.to_string(),
            ..source.meta
        };
        let entries: Vec<_> = source
            .entries
            .into_iter()
            .map(|mut e| {
                e.race_id = dest_race.to_string();
                e
            })
            .collect();
        self.repo.replace_start_list(&meta, &entries).await?;
        obs::emit_start_list_copied(source_race, dest_race, entries.len());
        Ok(StartList {
            race_id: dest_race.to_string(),
            meta,
            entries,
        })
    }
}
