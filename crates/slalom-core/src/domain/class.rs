//! Gender, racer class and scoring-class labels.

use serde::{Deserialize, Serialize};

use super::error::SlalomError;

/// Maximum Varsity entries per (race, team, gender).
pub const VARSITY_CAP: usize = 5;
/// Maximum Varsity Alternate entries per (race, team, gender).
pub const ALTERNATE_CAP: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Gender {
    type Err = SlalomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f" | "female" | "w" | "women" | "girls" => Ok(Gender::Female),
            "m" | "male" | "men" | "boys" => Ok(Gender::Male),
            other => Err(SlalomError::Validation(format!("unknown gender: {other}"))),
        }
    }
}

/// Roster class. Declaration order is start-list precedence, with DNS last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RacerClass {
    Varsity,
    VarsityAlternate,
    JrVarsity,
    Provisional,
    Dns,
}

impl RacerClass {
    /// Classes that carry a start order, in start-list precedence.
    pub const SEEDED: [RacerClass; 4] = [
        RacerClass::Varsity,
        RacerClass::VarsityAlternate,
        RacerClass::JrVarsity,
        RacerClass::Provisional,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RacerClass::Varsity => "Varsity",
            RacerClass::VarsityAlternate => "Varsity Alternate",
            RacerClass::JrVarsity => "Jr Varsity",
            RacerClass::Provisional => "Provisional",
            RacerClass::Dns => "DNS",
        }
    }

    pub fn is_dns(&self) -> bool {
        matches!(self, RacerClass::Dns)
    }

    /// Per-gender cap for capped classes.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            RacerClass::Varsity => Some(VARSITY_CAP),
            RacerClass::VarsityAlternate => Some(ALTERNATE_CAP),
            _ => None,
        }
    }

    /// Class used for points and team scoring. Varsity Alternate folds into Varsity.
    pub fn scoring_class(&self) -> Option<ScoringClass> {
        match self {
            RacerClass::Varsity | RacerClass::VarsityAlternate => Some(ScoringClass::Varsity),
            RacerClass::JrVarsity => Some(ScoringClass::JrVarsity),
            RacerClass::Provisional => Some(ScoringClass::Provisional),
            RacerClass::Dns => None,
        }
    }
}

impl std::fmt::Display for RacerClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for RacerClass {
    type Err = SlalomError;

    /// Accepts the labels timing exports and operators actually type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match folded.as_str() {
            "v" | "varsity" => Ok(RacerClass::Varsity),
            "va" | "alt" | "alternate" | "varsityalternate" | "varsityalt" => {
                Ok(RacerClass::VarsityAlternate)
            }
            "jv" | "jrvarsity" | "juniorvarsity" => Ok(RacerClass::JrVarsity),
            "p" | "prov" | "provisional" => Ok(RacerClass::Provisional),
            "dns" => Ok(RacerClass::Dns),
            _ => Err(SlalomError::Validation(format!("unknown class: {s}"))),
        }
    }
}

/// Results aggregation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringClass {
    Varsity,
    JrVarsity,
    Provisional,
}

impl ScoringClass {
    pub fn label(&self) -> &'static str {
        match self {
            ScoringClass::Varsity => "Varsity",
            ScoringClass::JrVarsity => "Jr Varsity",
            ScoringClass::Provisional => "Provisional",
        }
    }
}

/// Direction of a roster move. `Up` means toward start order 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl std::str::FromStr for Direction {
    type Err = SlalomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(SlalomError::Validation(format!("unknown direction: {other}"))),
        }
    }
}
