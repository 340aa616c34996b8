//! Domain models for slalom.
//!
//! Canonical definitions for the core entities:
//! - `Team`, `Racer`: directory records the engines read
//! - `Race`: carries the lock flag every mutation checks
//! - `RosterEntry`: a racer's class and start order for one race

pub mod class;
pub mod error;
pub mod records;

pub use class::{Direction, Gender, RacerClass, ScoringClass, ALTERNATE_CAP, VARSITY_CAP};
pub use error::{Result, SlalomError};
pub use records::{Race, Racer, RosterCount, RosterEntry, Team};
