//! Slalom Core Library
//!
//! Roster ordering, start-list seeding and results scoring for a ski racing
//! league, on top of any [`slalom_state::DocumentStore`].
//!
//! [`Slalom`] bundles every service over one store:
//!
//! ```ignore
//! let slalom = Slalom::new(Arc::new(MemoryDocumentStore::new()), EngineConfig::default());
//! let race = slalom.races.create("Opener", None, None).await?;
//! ```

pub mod config;
pub mod directory;
pub mod domain;
pub mod obs;
pub mod races;
pub mod repo;
pub mod results;
pub mod roster;
pub mod start_list;
pub mod telemetry;

use std::sync::Arc;

use slalom_state::DocumentStore;

pub use config::{BibPlan, EngineConfig, TimeUnit};
pub use directory::DirectoryService;
pub use domain::{
    Direction, Gender, Race, Racer, RacerClass, Result, RosterCount, RosterEntry, ScoringClass,
    SlalomError, Team, ALTERNATE_CAP, VARSITY_CAP,
};
pub use races::RaceService;
pub use repo::Repository;
pub use results::{
    IssueKind, RaceResults, RawCompetitor, RawRun, ReconciliationIssue, ResultEntry, ResultGroup,
    ResultsService, TeamScore,
};
pub use roster::{MoveTransition, RosterService, TeamRoster};
pub use start_list::{StartList, StartListEntry, StartListMeta, StartListService};

/// Every slalom service over one shared store.
pub struct Slalom<S> {
    pub races: RaceService<S>,
    pub directory: DirectoryService<S>,
    pub roster: RosterService<S>,
    pub start_list: StartListService<S>,
    pub results: ResultsService<S>,
}

impl<S> Clone for Slalom<S> {
    fn clone(&self) -> Self {
        Self {
            races: self.races.clone(),
            directory: self.directory.clone(),
            roster: self.roster.clone(),
            start_list: self.start_list.clone(),
            results: self.results.clone(),
        }
    }
}

impl<S: DocumentStore> Slalom<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let repo = Repository::new(store).with_page_size(config.page_size);
        Self {
            races: RaceService::new(repo.clone()),
            directory: DirectoryService::new(repo.clone()),
            roster: RosterService::new(repo.clone()),
            start_list: StartListService::new(repo.clone(), config.bibs),
            results: ResultsService::new(repo, config.bibs, config.time_unit),
        }
    }
}
