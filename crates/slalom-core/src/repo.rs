//! Typed record access over a [`DocumentStore`].
//!
//! Owns the key scheme:
//!
//! | collection  | partition            | sort             |
//! |-------------|----------------------|------------------|
//! | teams       | `teams`              | team id          |
//! | racers      | team id              | racer id         |
//! | races       | `races`              | race id          |
//! | roster      | `{race_id}#{team_id}`| racer id         |
//! | start_list  | race id              | bib, 5 digits    |
//! | results     | race id              | bib, 5 digits    |
//!
//! Bib 0 of the start-list and results partitions holds race-level metadata.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use slalom_state::{
    Collection, Document, DocumentStore, PutCondition, RecordKey, StorageError, DEFAULT_PAGE_SIZE,
};
use tracing::debug;

use crate::domain::{Race, Racer, Result, RosterEntry, SlalomError, Team};
use crate::results::model::{ResultEntry, ResultSummary};
use crate::start_list::model::{StartListEntry, StartListMeta};

const TEAMS_PARTITION: &str = "teams";
const RACES_PARTITION: &str = "races";
/// Bib reserved for race-level metadata records.
pub const META_BIB: u32 = 0;

pub fn roster_partition(race_id: &str, team_id: &str) -> String {
    format!("{race_id}#{team_id}")
}

pub fn bib_sort(bib: u32) -> String {
    format!("{bib:05}")
}

/// Typed repository shared by every service.
pub struct Repository<S> {
    store: Arc<S>,
    page_size: usize,
}

impl<S> Clone for Repository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            page_size: self.page_size,
        }
    }
}

impl<S> Repository<S>
where
    S: DocumentStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    // -- generic helpers -----------------------------------------------------

    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &RecordKey,
    ) -> Result<Option<T>> {
        match self.store.get(collection, key).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(
        &self,
        collection: Collection,
        key: RecordKey,
        value: &T,
        condition: PutCondition,
    ) -> Result<()> {
        let doc = Document::encode(key, value)?;
        self.store.put(collection, doc, condition).await?;
        Ok(())
    }

    async fn scan(&self, collection: Collection, partition: &str) -> Result<Vec<Document>> {
        Ok(self
            .store
            .query_all(collection, partition, self.page_size)
            .await?)
    }

    async fn scan_decoded<T: DeserializeOwned>(
        &self,
        collection: Collection,
        partition: &str,
    ) -> Result<Vec<T>> {
        self.scan(collection, partition)
            .await?
            .iter()
            .map(|d| d.decode().map_err(SlalomError::from))
            .collect()
    }

    /// Delete every record of a partition, one record at a time.
    async fn clear_partition(&self, collection: Collection, partition: &str) -> Result<usize> {
        let docs = self.scan(collection, partition).await?;
        for doc in &docs {
            self.store.delete(collection, &doc.key).await?;
        }
        debug!(collection = %collection, partition, removed = docs.len(), "cleared partition");
        Ok(docs.len())
    }

    // -- directory -----------------------------------------------------------

    pub async fn put_team(&self, team: &Team) -> Result<()> {
        self.write(
            Collection::Teams,
            RecordKey::new(TEAMS_PARTITION, &team.id),
            team,
            PutCondition::Always,
        )
        .await
    }

    pub async fn team(&self, team_id: &str) -> Result<Team> {
        self.fetch(Collection::Teams, &RecordKey::new(TEAMS_PARTITION, team_id))
            .await?
            .ok_or_else(|| SlalomError::not_found("team", team_id))
    }

    pub async fn teams(&self) -> Result<Vec<Team>> {
        self.scan_decoded(Collection::Teams, TEAMS_PARTITION).await
    }

    pub async fn put_racer(&self, racer: &Racer) -> Result<()> {
        self.write(
            Collection::Racers,
            RecordKey::new(&racer.team_id, &racer.id),
            racer,
            PutCondition::Always,
        )
        .await
    }

    pub async fn racer(&self, team_id: &str, racer_id: &str) -> Result<Racer> {
        self.fetch(Collection::Racers, &RecordKey::new(team_id, racer_id))
            .await?
            .ok_or_else(|| SlalomError::not_found("racer", racer_id))
    }

    pub async fn racers(&self, team_id: &str) -> Result<Vec<Racer>> {
        self.scan_decoded(Collection::Racers, team_id).await
    }

    // -- races ---------------------------------------------------------------

    pub async fn put_race(&self, race: &Race) -> Result<()> {
        self.write(
            Collection::Races,
            RecordKey::new(RACES_PARTITION, &race.id),
            race,
            PutCondition::Always,
        )
        .await
    }

    pub async fn race(&self, race_id: &str) -> Result<Race> {
        self.fetch(Collection::Races, &RecordKey::new(RACES_PARTITION, race_id))
            .await?
            .ok_or_else(|| SlalomError::not_found("race", race_id))
    }

    /// Fetch a race and fail with `RaceLocked` if it is locked.
    pub async fn unlocked_race(&self, race_id: &str) -> Result<Race> {
        let race = self.race(race_id).await?;
        if race.locked {
            return Err(SlalomError::RaceLocked {
                race_id: race.id,
            });
        }
        Ok(race)
    }

    pub async fn races(&self) -> Result<Vec<Race>> {
        self.scan_decoded(Collection::Races, RACES_PARTITION).await
    }

    pub async fn delete_race(&self, race_id: &str) -> Result<()> {
        self.store
            .delete(Collection::Races, &RecordKey::new(RACES_PARTITION, race_id))
            .await?;
        Ok(())
    }

    // -- roster --------------------------------------------------------------

    pub async fn roster(&self, race_id: &str, team_id: &str) -> Result<Vec<RosterEntry>> {
        self.scan_decoded(Collection::Roster, &roster_partition(race_id, team_id))
            .await
    }

    /// Write a roster entry. A failed `MustNotExist` surfaces as `DuplicateEntry`.
    pub async fn put_roster_entry(
        &self,
        entry: &RosterEntry,
        condition: PutCondition,
    ) -> Result<()> {
        let key = RecordKey::new(
            roster_partition(&entry.race_id, &entry.team_id),
            &entry.racer_id,
        );
        match self.write(Collection::Roster, key, entry, condition).await {
            Err(SlalomError::Storage(StorageError::ConditionFailed { .. }))
                if condition == PutCondition::MustNotExist =>
            {
                Err(SlalomError::DuplicateEntry {
                    race_id: entry.race_id.clone(),
                    team_id: entry.team_id.clone(),
                    racer_id: entry.racer_id.clone(),
                })
            }
            other => other,
        }
    }

    pub async fn delete_roster_entry(
        &self,
        race_id: &str,
        team_id: &str,
        racer_id: &str,
    ) -> Result<()> {
        self.store
            .delete(
                Collection::Roster,
                &RecordKey::new(roster_partition(race_id, team_id), racer_id),
            )
            .await?;
        Ok(())
    }

    pub async fn clear_roster(&self, race_id: &str, team_id: &str) -> Result<usize> {
        self.clear_partition(Collection::Roster, &roster_partition(race_id, team_id))
            .await
    }

    // -- start list ----------------------------------------------------------

    pub async fn start_list(
        &self,
        race_id: &str,
    ) -> Result<(Option<StartListMeta>, Vec<StartListEntry>)> {
        let docs = self.scan(Collection::StartList, race_id).await?;
        let meta_sort = bib_sort(META_BIB);
        let mut meta = None;
        let mut entries = Vec::with_capacity(docs.len());
        for doc in docs {
            if doc.key.sort == meta_sort {
                meta = Some(doc.decode()?);
            } else {
                entries.push(doc.decode()?);
            }
        }
        Ok((meta, entries))
    }

    pub async fn put_start_list_meta(&self, meta: &StartListMeta) -> Result<()> {
        self.write(
            Collection::StartList,
            RecordKey::new(&meta.race_id, bib_sort(META_BIB)),
            meta,
            PutCondition::Always,
        )
        .await
    }

    /// Delete-all then recreate. Not atomic.
    pub async fn replace_start_list(
        &self,
        meta: &StartListMeta,
        entries: &[StartListEntry],
    ) -> Result<()> {
        self.clear_partition(Collection::StartList, &meta.race_id)
            .await?;
        self.put_start_list_meta(meta).await?;
        for entry in entries {
            self.write(
                Collection::StartList,
                RecordKey::new(&entry.race_id, bib_sort(entry.bib)),
                entry,
                PutCondition::Always,
            )
            .await?;
        }
        Ok(())
    }

    pub async fn clear_start_list(&self, race_id: &str) -> Result<usize> {
        self.clear_partition(Collection::StartList, race_id).await
    }

    // -- results -------------------------------------------------------------

    pub async fn results(
        &self,
        race_id: &str,
    ) -> Result<(Option<ResultSummary>, Vec<ResultEntry>)> {
        let docs = self.scan(Collection::Results, race_id).await?;
        let meta_sort = bib_sort(META_BIB);
        let mut summary = None;
        let mut entries = Vec::with_capacity(docs.len());
        for doc in docs {
            if doc.key.sort == meta_sort {
                summary = Some(doc.decode()?);
            } else {
                entries.push(doc.decode()?);
            }
        }
        Ok((summary, entries))
    }

    /// Delete-all then recreate. Not atomic.
    pub async fn replace_results(
        &self,
        summary: &ResultSummary,
        entries: &[ResultEntry],
    ) -> Result<()> {
        self.clear_partition(Collection::Results, &summary.race_id)
            .await?;
        self.write(
            Collection::Results,
            RecordKey::new(&summary.race_id, bib_sort(META_BIB)),
            summary,
            PutCondition::Always,
        )
        .await?;
        for entry in entries {
            self.write(
                Collection::Results,
                RecordKey::new(&entry.race_id, bib_sort(entry.bib)),
                entry,
                PutCondition::Always,
            )
            .await?;
        }
        Ok(())
    }

    pub async fn clear_results(&self, race_id: &str) -> Result<usize> {
        self.clear_partition(Collection::Results, race_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use slalom_state::fakes::MemoryDocumentStore;

    fn repo() -> Repository<MemoryDocumentStore> {
        Repository::new(Arc::new(MemoryDocumentStore::new())).with_page_size(2)
    }

    #[test]
    fn bib_sort_keys_order_numerically() {
        assert!(bib_sort(9) < bib_sort(10));
        assert!(bib_sort(META_BIB) < bib_sort(1));
    }

    #[tokio::test]
    async fn unlocked_race_rejects_locked() {
        let repo = repo();
        let race = Race {
            id: "r1".to_string(),
            name: "Slalom 1".to_string(),
            venue: None,
            date: None,
            locked: true,
            created_at: Utc::now(),
        };
        repo.put_race(&race).await.unwrap();

        let err = repo.unlocked_race("r1").await.unwrap_err();
        assert!(matches!(err, SlalomError::RaceLocked { .. }));
        assert!(matches!(
            repo.race("missing").await.unwrap_err(),
            SlalomError::NotFound { kind: "race", .. }
        ));
    }

    #[tokio::test]
    async fn replace_start_list_drops_stale_bibs() {
        let repo = repo();
        let entry = |bib: u32| StartListEntry {
            race_id: "r1".to_string(),
            bib,
            racer_id: format!("racer-{bib}"),
            racer_name: format!("Racer {bib}"),
            team_id: "t1".to_string(),
            team_name: "North".to_string(),
            gender: crate::domain::Gender::Female,
            class: crate::domain::RacerClass::Varsity,
            seed: bib,
        };
        let meta = StartListMeta::empty("r1");
        repo.replace_start_list(&meta, &[entry(1), entry(2), entry(3)])
            .await
            .unwrap();
        repo.replace_start_list(&meta, &[entry(1)]).await.unwrap();

        let (stored_meta, entries) = repo.start_list("r1").await.unwrap();
        assert_eq!(stored_meta, Some(meta));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bib, 1);
    }
}
