//! Directory, race and roster records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::class::{Gender, RacerClass};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// On rosters and start lists, but excluded from league scoring.
    #[serde(default)]
    pub non_league: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Racer {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub gender: Gender,
    pub base_class: RacerClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Blocks roster, start-list and results mutation. Reads are unaffected.
    #[serde(default)]
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

/// One racer's place on a team roster for a race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub race_id: String,
    pub team_id: String,
    pub racer_id: String,
    pub racer_name: String,
    /// Copied from the racer at add time.
    pub gender: Gender,
    /// Copied from the racer at add time.
    pub base_class: RacerClass,
    pub class: RacerClass,
    /// 1-based position within the (gender, class) bucket; `None` for DNS.
    pub start_order: Option<u32>,
}

/// Roster size for one (race, team) pair. DNS entries are not counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterCount {
    pub race_id: String,
    pub team_id: String,
    pub female: usize,
    pub male: usize,
    pub total: usize,
}
