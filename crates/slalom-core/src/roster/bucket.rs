//! Ordered (gender, class) bucket.
//!
//! A bucket is the racer ids of one (race, team, gender, class) in start
//! order. Position `i` in the sequence is start order `i + 1`, so the
//! `{1..N}` invariant holds by construction; every mutation goes through
//! push / remove / replace / swap.

use crate::domain::{Gender, RacerClass, RosterEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    gender: Gender,
    class: RacerClass,
    members: Vec<String>,
}

impl Bucket {
    pub fn empty(gender: Gender, class: RacerClass) -> Self {
        Self {
            gender,
            class,
            members: Vec::new(),
        }
    }

    /// Collect the ordered members of a bucket from roster entries.
    ///
    /// Entries without a start order are detached and skipped.
    pub fn collect<'a>(
        entries: impl IntoIterator<Item = &'a RosterEntry>,
        gender: Gender,
        class: RacerClass,
    ) -> Self {
        let mut ordered: Vec<(u32, &str)> = entries
            .into_iter()
            .filter(|e| e.gender == gender && e.class == class)
            .filter_map(|e| e.start_order.map(|o| (o, e.racer_id.as_str())))
            .collect();
        ordered.sort();
        Self {
            gender,
            class,
            members: ordered.into_iter().map(|(_, id)| id.to_string()).collect(),
        }
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn class(&self) -> RacerClass {
        self.class
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Racer at a 1-based start order.
    pub fn at(&self, order: u32) -> Option<&str> {
        let idx = (order as usize).checked_sub(1)?;
        self.members.get(idx).map(String::as_str)
    }

    /// 1-based start order of a racer.
    pub fn order_of(&self, racer_id: &str) -> Option<u32> {
        self.members
            .iter()
            .position(|m| m == racer_id)
            .map(|idx| idx as u32 + 1)
    }

    /// Append at max + 1 and return the new start order.
    pub fn push(&mut self, racer_id: impl Into<String>) -> u32 {
        self.members.push(racer_id.into());
        self.members.len() as u32
    }

    /// Remove a racer; everyone behind moves up one slot.
    pub fn remove(&mut self, racer_id: &str) -> Option<u32> {
        let idx = self.members.iter().position(|m| m == racer_id)?;
        self.members.remove(idx);
        Some(idx as u32 + 1)
    }

    /// Put `racer_id` in the slot at `order`, returning the previous occupant.
    pub fn replace(&mut self, order: u32, racer_id: impl Into<String>) -> Option<String> {
        let idx = (order as usize).checked_sub(1)?;
        let slot = self.members.get_mut(idx)?;
        Some(std::mem::replace(slot, racer_id.into()))
    }

    /// Exchange the occupants of two start orders.
    pub fn swap(&mut self, a: u32, b: u32) -> bool {
        let len = self.members.len() as u32;
        if a == 0 || b == 0 || a > len || b > len {
            return false;
        }
        self.members.swap(a as usize - 1, b as usize - 1);
        true
    }

    /// `(racer_id, start_order)` pairs in order.
    pub fn slots(&self) -> impl Iterator<Item = (&str, u32)> {
        self.members
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.as_str(), idx as u32 + 1))
    }
}
