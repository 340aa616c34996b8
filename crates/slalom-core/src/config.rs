//! Engine configuration: bib numbering, timing units, store paging.

use serde::{Deserialize, Serialize};
use slalom_state::DEFAULT_PAGE_SIZE;

use crate::domain::{Gender, SlalomError};

/// First bib handed out per gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibPlan {
    pub female_first: u32,
    pub male_first: u32,
}

impl Default for BibPlan {
    fn default() -> Self {
        Self {
            female_first: 1,
            male_first: 100,
        }
    }
}

impl BibPlan {
    pub fn first_bib(&self, gender: Gender) -> u32 {
        match gender {
            Gender::Female => self.female_first,
            Gender::Male => self.male_first,
        }
    }

    /// Exclusive upper bound for a gender's bibs, if another range follows it.
    pub fn bib_limit(&self, gender: Gender) -> Option<u32> {
        let (own, other) = match gender {
            Gender::Female => (self.female_first, self.male_first),
            Gender::Male => (self.male_first, self.female_first),
        };
        (other > own).then_some(other)
    }

    /// Both first bibs are positive and distinct, so the two ranges never overlap.
    pub fn validate(&self) -> crate::domain::Result<()> {
        if self.female_first == 0 || self.male_first == 0 {
            return Err(SlalomError::Validation(
                "first bib must be at least 1".to_string(),
            ));
        }
        if self.female_first == self.male_first {
            return Err(SlalomError::Validation(format!(
                "female and male bibs both start at {}",
                self.female_first
            )));
        }
        Ok(())
    }

    /// Gender implied by a bib number's range.
    pub fn gender_of(&self, bib: u32) -> Option<Gender> {
        if bib == 0 {
            return None;
        }
        let in_range = |g: Gender| {
            bib >= self.first_bib(g) && self.bib_limit(g).map_or(true, |limit| bib < limit)
        };
        Gender::ALL.into_iter().find(|g| in_range(*g))
    }
}

/// Unit of the start/finish instants in raw timing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    #[default]
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    pub fn per_second(&self) -> i64 {
        match self {
            TimeUnit::Microseconds => 1_000_000,
            TimeUnit::Milliseconds => 1_000,
            TimeUnit::Seconds => 1,
        }
    }

    pub fn to_seconds(&self, units: i64) -> f64 {
        units as f64 / self.per_second() as f64
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" | "micros" | "microseconds" => Ok(TimeUnit::Microseconds),
            "ms" | "millis" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "s" | "secs" | "seconds" => Ok(TimeUnit::Seconds),
            other => Err(format!("unknown time unit: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub bibs: BibPlan,
    pub time_unit: TimeUnit,
    /// Documents fetched per partition page.
    pub page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bibs: BibPlan::default(),
            time_unit: TimeUnit::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
