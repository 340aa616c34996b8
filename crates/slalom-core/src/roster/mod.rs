//! Roster ordering engine.
//!
//! - [`bucket`]: one ordered (gender, class) bucket
//! - [`transition`]: the move decision table
//! - [`team_roster`]: pure roster mutations and diffing
//! - [`service`]: store-backed operations with race locking

pub mod bucket;
pub mod service;
pub mod team_roster;
pub mod transition;

pub use bucket::Bucket;
pub use service::RosterService;
pub use team_roster::{RosterChanges, TeamRoster};
pub use transition::{MoveContext, MoveTransition};
