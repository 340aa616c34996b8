//! Move decision table.
//!
//! Boundary rules across Varsity / Varsity Alternate / Jr Varsity are checked
//! before the generic in-bucket swap, in this priority:
//!
//! | mover                  | direction | transition         |
//! |------------------------|-----------|--------------------|
//! | Varsity Alternate      | up        | `PromoteAlternate` |
//! | Varsity Alternate      | down      | `DemoteAlternate`  |
//! | Jr Varsity #1          | up        | `PromoteJunior`    |
//! | last-ranked Varsity    | down      | `RelegateVarsity`  |
//! | anything else          | either    | `Swap` or `Stay`   |

use serde::Serialize;

use super::bucket::Bucket;
use crate::domain::{Direction, RacerClass, VARSITY_CAP};

/// The three boundary buckets of one gender plus the mover's own bucket.
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    pub varsity: &'a Bucket,
    pub alternate: &'a Bucket,
    pub junior: &'a Bucket,
    pub own: &'a Bucket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum MoveTransition {
    /// Alternate moves up into Varsity. Varsity #5, if present, drops to the
    /// alternate slot and the mover takes slot 5; otherwise the mover is appended.
    PromoteAlternate { relegated: Option<String> },
    /// Alternate moves down to Jr Varsity #1. The JV #1 racer, if present,
    /// takes the alternate slot.
    DemoteAlternate { promoted: Option<String> },
    /// Jr Varsity #1 moves up to alternate. An existing alternate becomes JV #1;
    /// otherwise the JV bucket is compacted.
    PromoteJunior { demoted: Option<String> },
    /// Last Varsity moves down to alternate. An existing alternate takes the
    /// mover's Varsity slot.
    RelegateVarsity { promoted: Option<String> },
    /// Exchange start orders with the adjacent racer in the same bucket.
    Swap { neighbor: String },
    /// Already first/last in the requested direction.
    Stay,
}

impl MoveTransition {
    /// Decide the transition for a non-DNS mover at `order` in `class`.
    pub fn plan(class: RacerClass, order: u32, direction: Direction, ctx: MoveContext<'_>) -> Self {
        let owned = |id: Option<&str>| id.map(str::to_string);

        match (class, direction) {
            (RacerClass::VarsityAlternate, Direction::Up) => MoveTransition::PromoteAlternate {
                relegated: owned(ctx.varsity.at(VARSITY_CAP as u32)),
            },
            (RacerClass::VarsityAlternate, Direction::Down) => MoveTransition::DemoteAlternate {
                promoted: owned(ctx.junior.at(1)),
            },
            (RacerClass::JrVarsity, Direction::Up) if order == 1 => MoveTransition::PromoteJunior {
                demoted: owned(ctx.alternate.at(1)),
            },
            (RacerClass::Varsity, Direction::Down) if order as usize == ctx.varsity.len() => {
                MoveTransition::RelegateVarsity {
                    promoted: owned(ctx.alternate.at(1)),
                }
            }
            (_, Direction::Up) => order
                .checked_sub(1)
                .and_then(|prev| ctx.own.at(prev))
                .map(|n| MoveTransition::Swap {
                    neighbor: n.to_string(),
                })
                .unwrap_or(MoveTransition::Stay),
            (_, Direction::Down) => ctx
                .own
                .at(order + 1)
                .map(|n| MoveTransition::Swap {
                    neighbor: n.to_string(),
                })
                .unwrap_or(MoveTransition::Stay),
        }
    }

    pub fn is_stay(&self) -> bool {
        matches!(self, MoveTransition::Stay)
    }
}
