//! Start-list records: per-race meta (draw orders, excluded bibs) and bib entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Gender, RacerClass};

/// One seeded racer in the start list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartListEntry {
    pub race_id: String,
    pub bib: u32,
    pub racer_id: String,
    pub racer_name: String,
    pub team_id: String,
    pub team_name: String,
    pub gender: Gender,
    /// Varsity Alternate is kept distinct from Varsity here.
    pub class: RacerClass,
    /// Roster start order the racer was seeded from.
    pub seed: u32,
}

/// Team draw order per gender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOrders {
    #[serde(default)]
    pub female: Vec<String>,
    #[serde(default)]
    pub male: Vec<String>,
}

impl DrawOrders {
    pub fn get(&self, gender: Gender) -> &[String] {
        match gender {
            Gender::Female => &self.female,
            Gender::Male => &self.male,
        }
    }

    pub fn set(&mut self, gender: Gender, order: Vec<String>) {
        match gender {
            Gender::Female => self.female = order,
            Gender::Male => self.male = order,
        }
    }
}

/// Race-level start-list metadata, stored under bib 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartListMeta {
    pub race_id: String,
    /// Bib numbers never handed out, ascending.
    #[serde(default)]
    pub excluded_bibs: Vec<u32>,
    #[serde(default)]
    pub draw_order: DrawOrders,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl StartListMeta {
    pub fn empty(race_id: impl Into<String>) -> Self {
        Self {
            race_id: race_id.into(),
            excluded_bibs: Vec::new(),
            draw_order: DrawOrders::default(),
            generated_at: None,
        }
    }
}

/// Snapshot returned by every start-list operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartList {
    pub race_id: String,
    pub meta: StartListMeta,
    /// Sorted by bib.
    pub entries: Vec<StartListEntry>,
}

impl StartList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_bib(&self, bib: u32) -> Option<&StartListEntry> {
        self.entries
            .binary_search_by_key(&bib, |e| e.bib)
            .ok()
            .map(|idx| &self.entries[idx])
    }
}
