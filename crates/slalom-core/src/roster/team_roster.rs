//! In-memory model of one (race, team) roster.
//!
//! Every mutation is computed against a loaded snapshot; [`TeamRoster::changes`]
//! then diffs the result against what was loaded so only touched records are
//! written.

use std::collections::BTreeMap;

use serde::Serialize;

use super::bucket::Bucket;
use super::transition::{MoveContext, MoveTransition};
use crate::domain::{
    Direction, Gender, Racer, RacerClass, Result, RosterCount, RosterEntry, SlalomError,
    VARSITY_CAP,
};

/// Records to write after a roster mutation. Puts go before deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterChanges {
    /// New keys; written with `MustNotExist`.
    pub inserts: Vec<RosterEntry>,
    pub updates: Vec<RosterEntry>,
    /// Racer ids whose records go away.
    pub deletes: Vec<String>,
}

impl RosterChanges {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }
}

#[derive(Debug, Clone)]
pub struct TeamRoster {
    race_id: String,
    team_id: String,
    loaded: BTreeMap<String, RosterEntry>,
    entries: BTreeMap<String, RosterEntry>,
}

impl TeamRoster {
    pub fn load(
        race_id: impl Into<String>,
        team_id: impl Into<String>,
        entries: impl IntoIterator<Item = RosterEntry>,
    ) -> Self {
        let entries: BTreeMap<_, _> = entries
            .into_iter()
            .map(|e| (e.racer_id.clone(), e))
            .collect();
        Self {
            race_id: race_id.into(),
            team_id: team_id.into(),
            loaded: entries.clone(),
            entries,
        }
    }

    pub fn race_id(&self) -> &str {
        &self.race_id
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    pub fn get(&self, racer_id: &str) -> Option<&RosterEntry> {
        self.entries.get(racer_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by gender, class precedence, then start order. DNS entries
    /// sort by racer name.
    pub fn entries(&self) -> Vec<RosterEntry> {
        let mut out: Vec<RosterEntry> = self.entries.values().cloned().collect();
        sort_entries(&mut out);
        out
    }

    pub fn bucket(&self, gender: Gender, class: RacerClass) -> Bucket {
        Bucket::collect(self.entries.values(), gender, class)
    }

    pub fn count(&self) -> RosterCount {
        let active = |g: Gender| {
            self.entries
                .values()
                .filter(|e| e.gender == g && !e.class.is_dns())
                .count()
        };
        let female = active(Gender::Female);
        let male = active(Gender::Male);
        RosterCount {
            race_id: self.race_id.clone(),
            team_id: self.team_id.clone(),
            female,
            male,
            total: female + male,
        }
    }

    /// Class an added racer lands in.
    pub fn resolve_class(base: RacerClass, desired: Option<RacerClass>) -> RacerClass {
        match (base, desired) {
            (RacerClass::Provisional, Some(RacerClass::Dns)) => RacerClass::Dns,
            (RacerClass::Provisional, _) => RacerClass::Provisional,
            (base, desired) => desired.unwrap_or(base),
        }
    }

    /// Add a racer at the back of its bucket.
    pub fn add(&mut self, racer: &Racer, desired: Option<RacerClass>) -> Result<&RosterEntry> {
        if self.entries.contains_key(&racer.id) {
            return Err(SlalomError::DuplicateEntry {
                race_id: self.race_id.clone(),
                team_id: self.team_id.clone(),
                racer_id: racer.id.clone(),
            });
        }
        let class = Self::resolve_class(racer.base_class, desired);
        self.ensure_room(racer.gender, class)?;

        let start_order = if class.is_dns() {
            None
        } else {
            Some(self.bucket(racer.gender, class).push(racer.id.as_str()))
        };
        let entry = RosterEntry {
            race_id: self.race_id.clone(),
            team_id: self.team_id.clone(),
            racer_id: racer.id.clone(),
            racer_name: racer.name.clone(),
            gender: racer.gender,
            base_class: racer.base_class,
            class,
            start_order,
        };
        Ok(self.entries.entry(racer.id.clone()).or_insert(entry))
    }

    /// Move an entry to another class, compacting the bucket it left.
    /// Returns `false` when the class is unchanged.
    pub fn reclassify(&mut self, racer_id: &str, class: RacerClass) -> Result<bool> {
        let entry = self.require(racer_id)?;
        if entry.class == class {
            return Ok(false);
        }
        let provisional =
            entry.class == RacerClass::Provisional || entry.base_class == RacerClass::Provisional;
        if provisional && !matches!(class, RacerClass::Provisional | RacerClass::Dns) {
            return Err(SlalomError::ProvisionalLocked {
                racer_id: racer_id.to_string(),
            });
        }
        let (gender, from) = (entry.gender, entry.class);
        self.ensure_room(gender, class)?;

        self.detach(racer_id, gender, from);
        self.attach(racer_id, gender, class);
        Ok(true)
    }

    /// Delete an entry and compact its bucket. Absent entries are a no-op.
    pub fn remove(&mut self, racer_id: &str) -> bool {
        let Some(entry) = self.entries.get(racer_id) else {
            return false;
        };
        let (gender, class) = (entry.gender, entry.class);
        self.detach(racer_id, gender, class);
        self.entries.remove(racer_id);
        true
    }

    /// Move an entry one step up or down, crossing class boundaries where the
    /// decision table says so.
    pub fn move_entry(&mut self, racer_id: &str, direction: Direction) -> Result<MoveTransition> {
        let entry = self.require(racer_id)?;
        let (gender, class) = (entry.gender, entry.class);
        let Some(order) = entry.start_order.filter(|_| !class.is_dns()) else {
            return Err(SlalomError::InvalidState(format!(
                "racer {racer_id} is DNS and has no start order"
            )));
        };

        let mut varsity = self.bucket(gender, RacerClass::Varsity);
        let mut alternate = self.bucket(gender, RacerClass::VarsityAlternate);
        let mut junior = self.bucket(gender, RacerClass::JrVarsity);
        let mut other = self.bucket(gender, class);

        let transition = {
            let own = match class {
                RacerClass::Varsity => &varsity,
                RacerClass::VarsityAlternate => &alternate,
                RacerClass::JrVarsity => &junior,
                _ => &other,
            };
            MoveTransition::plan(
                class,
                order,
                direction,
                MoveContext {
                    varsity: &varsity,
                    alternate: &alternate,
                    junior: &junior,
                    own,
                },
            )
        };

        if transition.is_stay() {
            return Ok(transition);
        }
        match &transition {
            MoveTransition::PromoteAlternate { relegated } => match relegated {
                Some(v5) => {
                    varsity.replace(VARSITY_CAP as u32, racer_id);
                    alternate.replace(order, v5.as_str());
                }
                None => {
                    alternate.remove(racer_id);
                    varsity.push(racer_id);
                }
            },
            MoveTransition::DemoteAlternate { promoted } => match promoted {
                Some(j1) => {
                    junior.replace(1, racer_id);
                    alternate.replace(order, j1.as_str());
                }
                None => {
                    alternate.remove(racer_id);
                    junior.push(racer_id);
                }
            },
            MoveTransition::PromoteJunior { demoted } => match demoted {
                Some(va) => {
                    junior.replace(order, va.as_str());
                    alternate.replace(1, racer_id);
                }
                None => {
                    junior.remove(racer_id);
                    alternate.push(racer_id);
                }
            },
            MoveTransition::RelegateVarsity { promoted } => match promoted {
                Some(va) => {
                    varsity.replace(order, va.as_str());
                    alternate.replace(1, racer_id);
                }
                None => {
                    varsity.remove(racer_id);
                    alternate.push(racer_id);
                }
            },
            MoveTransition::Swap { neighbor } => {
                let bucket = match class {
                    RacerClass::Varsity => &mut varsity,
                    RacerClass::VarsityAlternate => &mut alternate,
                    RacerClass::JrVarsity => &mut junior,
                    _ => &mut other,
                };
                if let Some(theirs) = bucket.order_of(neighbor) {
                    bucket.swap(order, theirs);
                }
            }
            MoveTransition::Stay => {}
        }

        for bucket in [&varsity, &alternate, &junior] {
            self.write_back(bucket);
        }
        if !matches!(
            class,
            RacerClass::Varsity | RacerClass::VarsityAlternate | RacerClass::JrVarsity
        ) {
            self.write_back(&other);
        }
        Ok(transition)
    }

    /// Rebuild this roster from another race's entries: DNS entries are left
    /// out, over-cap entries are dropped and buckets are renumbered in source
    /// order. Returns the racer ids that did not fit.
    pub fn replace_from(&mut self, source: &[RosterEntry]) -> Vec<String> {
        let mut ordered: Vec<&RosterEntry> =
            source.iter().filter(|e| !e.class.is_dns()).collect();
        ordered.sort_by_key(|e| (e.gender, e.class, e.start_order, e.racer_id.clone()));

        self.entries.clear();
        let mut buckets: BTreeMap<(Gender, RacerClass), Bucket> = BTreeMap::new();
        let mut dropped = Vec::new();
        for src in ordered {
            let bucket = buckets
                .entry((src.gender, src.class))
                .or_insert_with(|| Bucket::empty(src.gender, src.class));
            if src.class.capacity().is_some_and(|cap| bucket.len() >= cap) {
                dropped.push(src.racer_id.clone());
                continue;
            }
            let order = bucket.push(src.racer_id.as_str());
            self.entries.insert(
                src.racer_id.clone(),
                RosterEntry {
                    race_id: self.race_id.clone(),
                    team_id: self.team_id.clone(),
                    start_order: Some(order),
                    ..src.clone()
                },
            );
        }
        dropped
    }

    /// Diff against the loaded snapshot.
    pub fn changes(&self) -> RosterChanges {
        let mut changes = RosterChanges::default();
        for (id, entry) in &self.entries {
            match self.loaded.get(id) {
                None => changes.inserts.push(entry.clone()),
                Some(before) if before != entry => changes.updates.push(entry.clone()),
                Some(_) => {}
            }
        }
        changes.deletes = self
            .loaded
            .keys()
            .filter(|id| !self.entries.contains_key(*id))
            .cloned()
            .collect();
        changes
    }

    /// Broken roster invariants, as readable messages. Empty when healthy.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        for gender in Gender::ALL {
            for class in RacerClass::SEEDED {
                let mut orders: Vec<Option<u32>> = self
                    .entries
                    .values()
                    .filter(|e| e.gender == gender && e.class == class)
                    .map(|e| e.start_order)
                    .collect();
                orders.sort();
                let expected: Vec<Option<u32>> = (1..=orders.len() as u32).map(Some).collect();
                if orders != expected {
                    out.push(format!("{gender} {class} orders are {orders:?}"));
                }
                if let Some(cap) = class.capacity().filter(|cap| orders.len() > *cap) {
                    out.push(format!("{gender} {class} holds {} (cap {cap})", orders.len()));
                }
            }
        }
        for e in self.entries.values() {
            if e.class.is_dns() && e.start_order.is_some() {
                out.push(format!("DNS racer {} has a start order", e.racer_id));
            }
            if e.base_class == RacerClass::Provisional
                && !matches!(e.class, RacerClass::Provisional | RacerClass::Dns)
            {
                out.push(format!("provisional racer {} is {}", e.racer_id, e.class));
            }
        }
        out
    }

    fn require(&self, racer_id: &str) -> Result<&RosterEntry> {
        self.entries
            .get(racer_id)
            .ok_or_else(|| SlalomError::not_found("roster entry", racer_id))
    }

    fn ensure_room(&self, gender: Gender, class: RacerClass) -> Result<()> {
        let Some(limit) = class.capacity() else {
            return Ok(());
        };
        if self.bucket(gender, class).len() >= limit {
            return Err(SlalomError::CapacityExceeded {
                gender,
                class,
                limit,
            });
        }
        Ok(())
    }

    fn detach(&mut self, racer_id: &str, gender: Gender, class: RacerClass) {
        if class.is_dns() {
            return;
        }
        let mut bucket = self.bucket(gender, class);
        if bucket.remove(racer_id).is_some() {
            self.write_back(&bucket);
        }
    }

    fn attach(&mut self, racer_id: &str, gender: Gender, class: RacerClass) {
        let start_order = if class.is_dns() {
            None
        } else {
            Some(self.bucket(gender, class).push(racer_id))
        };
        if let Some(entry) = self.entries.get_mut(racer_id) {
            entry.class = class;
            entry.start_order = start_order;
        }
    }

    fn write_back(&mut self, bucket: &Bucket) {
        for (id, order) in bucket.slots() {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.class = bucket.class();
                entry.start_order = Some(order);
            }
        }
    }
}

pub(crate) fn sort_entries(entries: &mut [RosterEntry]) {
    entries.sort_by(|a, b| {
        (a.gender, a.class, a.start_order, &a.racer_name, &a.racer_id).cmp(&(
            b.gender,
            b.class,
            b.start_order,
            &b.racer_name,
            &b.racer_id,
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn racer(id: &str, gender: Gender, base: RacerClass) -> Racer {
        Racer {
            id: id.to_string(),
            team_id: "north".to_string(),
            name: format!("Racer {id}"),
            gender,
            base_class: base,
        }
    }

    fn roster_with(classes: &[(&str, RacerClass)]) -> TeamRoster {
        let mut roster = TeamRoster::load("r1", "north", Vec::new());
        for (id, class) in classes {
            roster
                .add(&racer(id, Gender::Female, *class), None)
                .unwrap();
        }
        roster
    }

    fn order(roster: &TeamRoster, id: &str) -> (RacerClass, Option<u32>) {
        let e = roster.get(id).unwrap();
        (e.class, e.start_order)
    }

    #[test]
    fn provisional_base_resolves_to_provisional_or_dns() {
        use RacerClass::*;
        assert_eq!(TeamRoster::resolve_class(Provisional, Some(Varsity)), Provisional);
        assert_eq!(TeamRoster::resolve_class(Provisional, Some(Dns)), Dns);
        assert_eq!(TeamRoster::resolve_class(JrVarsity, Some(Varsity)), Varsity);
        assert_eq!(TeamRoster::resolve_class(JrVarsity, None), JrVarsity);
    }

    #[test]
    fn sixth_varsity_is_rejected() {
        let ids = ["a", "b", "c", "d", "e"];
        let mut roster = roster_with(&ids.map(|id| (id, RacerClass::Varsity)));
        let err = roster
            .add(&racer("f", Gender::Female, RacerClass::Varsity), None)
            .unwrap_err();
        assert!(matches!(
            err,
            SlalomError::CapacityExceeded {
                limit: VARSITY_CAP,
                ..
            }
        ));
        assert_eq!(roster.len(), 5);
        // Male bucket is independent.
        roster
            .add(&racer("m", Gender::Male, RacerClass::Varsity), None)
            .unwrap();
    }

    #[test]
    fn reclassify_compacts_and_appends() {
        let mut roster = roster_with(&[
            ("a", RacerClass::JrVarsity),
            ("b", RacerClass::JrVarsity),
            ("c", RacerClass::JrVarsity),
            ("v", RacerClass::Varsity),
        ]);
        assert!(roster.reclassify("a", RacerClass::Varsity).unwrap());
        assert_eq!(order(&roster, "a"), (RacerClass::Varsity, Some(2)));
        assert_eq!(order(&roster, "b"), (RacerClass::JrVarsity, Some(1)));
        assert_eq!(order(&roster, "c"), (RacerClass::JrVarsity, Some(2)));

        assert!(roster.reclassify("b", RacerClass::Dns).unwrap());
        assert_eq!(order(&roster, "b"), (RacerClass::Dns, None));
        assert_eq!(order(&roster, "c"), (RacerClass::JrVarsity, Some(1)));
        assert!(!roster.reclassify("c", RacerClass::JrVarsity).unwrap());
        assert!(roster.violations().is_empty());
    }

    #[test]
    fn provisional_stays_provisional() {
        let mut roster = roster_with(&[("p", RacerClass::Provisional)]);
        assert!(matches!(
            roster.reclassify("p", RacerClass::Varsity),
            Err(SlalomError::ProvisionalLocked { .. })
        ));
        roster.reclassify("p", RacerClass::Dns).unwrap();
        assert!(matches!(
            roster.reclassify("p", RacerClass::JrVarsity),
            Err(SlalomError::ProvisionalLocked { .. })
        ));
        roster.reclassify("p", RacerClass::Provisional).unwrap();
        assert_eq!(order(&roster, "p"), (RacerClass::Provisional, Some(1)));
    }

    #[test]
    fn remove_is_idempotent() {
        let seeded = roster_with(&[("a", RacerClass::Varsity), ("b", RacerClass::Varsity)]);
        let mut roster = TeamRoster::load("r1", "north", seeded.entries());
        assert!(roster.remove("a"));
        assert!(!roster.remove("a"));
        assert_eq!(order(&roster, "b"), (RacerClass::Varsity, Some(1)));
        let changes = roster.changes();
        assert_eq!(changes.deletes, vec!["a".to_string()]);
        assert_eq!(changes.updates.len(), 1);
        assert_eq!(changes.updates[0].racer_id, "b");
        assert!(changes.inserts.is_empty());
    }

    #[test]
    fn removing_a_fresh_insert_leaves_no_writes() {
        let mut roster = roster_with(&[("a", RacerClass::Varsity)]);
        assert!(roster.remove("a"));
        assert!(roster.changes().is_empty());
    }

    #[test]
    fn alternate_up_swaps_with_fifth_varsity() {
        let mut roster = roster_with(&[
            ("v1", RacerClass::Varsity),
            ("v2", RacerClass::Varsity),
            ("v3", RacerClass::Varsity),
            ("v4", RacerClass::Varsity),
            ("v5", RacerClass::Varsity),
            ("alt", RacerClass::VarsityAlternate),
        ]);
        roster.move_entry("alt", Direction::Up).unwrap();
        assert_eq!(order(&roster, "alt"), (RacerClass::Varsity, Some(5)));
        assert_eq!(order(&roster, "v5"), (RacerClass::VarsityAlternate, Some(1)));
        assert!(roster.violations().is_empty());
    }

    #[test]
    fn alternate_up_appends_to_short_varsity() {
        let mut roster =
            roster_with(&[("v1", RacerClass::Varsity), ("alt", RacerClass::VarsityAlternate)]);
        roster.move_entry("alt", Direction::Up).unwrap();
        assert_eq!(order(&roster, "alt"), (RacerClass::Varsity, Some(2)));
        assert!(roster
            .bucket(Gender::Female, RacerClass::VarsityAlternate)
            .is_empty());
    }

    #[test]
    fn alternate_down_trades_with_first_junior() {
        let mut roster = roster_with(&[
            ("alt", RacerClass::VarsityAlternate),
            ("j1", RacerClass::JrVarsity),
            ("j2", RacerClass::JrVarsity),
        ]);
        roster.move_entry("alt", Direction::Down).unwrap();
        assert_eq!(order(&roster, "alt"), (RacerClass::JrVarsity, Some(1)));
        assert_eq!(order(&roster, "j1"), (RacerClass::VarsityAlternate, Some(1)));
        assert_eq!(order(&roster, "j2"), (RacerClass::JrVarsity, Some(2)));
    }

    #[test]
    fn alternate_down_without_juniors_becomes_first_junior() {
        let mut roster = roster_with(&[("alt", RacerClass::VarsityAlternate)]);
        let t = roster.move_entry("alt", Direction::Down).unwrap();
        assert_eq!(t, MoveTransition::DemoteAlternate { promoted: None });
        assert_eq!(order(&roster, "alt"), (RacerClass::JrVarsity, Some(1)));
    }

    #[test]
    fn first_junior_up_promotes_and_compacts() {
        let mut roster =
            roster_with(&[("j1", RacerClass::JrVarsity), ("j2", RacerClass::JrVarsity)]);
        roster.move_entry("j1", Direction::Up).unwrap();
        assert_eq!(order(&roster, "j1"), (RacerClass::VarsityAlternate, Some(1)));
        assert_eq!(order(&roster, "j2"), (RacerClass::JrVarsity, Some(1)));

        // Now an alternate exists: j2 trades places with it.
        roster.move_entry("j2", Direction::Up).unwrap();
        assert_eq!(order(&roster, "j2"), (RacerClass::VarsityAlternate, Some(1)));
        assert_eq!(order(&roster, "j1"), (RacerClass::JrVarsity, Some(1)));
    }

    #[test]
    fn last_varsity_down_relegates_or_trades() {
        let mut roster = roster_with(&[("v1", RacerClass::Varsity), ("v2", RacerClass::Varsity)]);
        roster.move_entry("v2", Direction::Down).unwrap();
        assert_eq!(order(&roster, "v2"), (RacerClass::VarsityAlternate, Some(1)));

        roster.move_entry("v1", Direction::Down).unwrap();
        assert_eq!(order(&roster, "v1"), (RacerClass::VarsityAlternate, Some(1)));
        assert_eq!(order(&roster, "v2"), (RacerClass::Varsity, Some(1)));
        assert!(roster.violations().is_empty());
    }

    #[test]
    fn generic_swap_and_edges() {
        let mut roster = roster_with(&[
            ("p1", RacerClass::Provisional),
            ("p2", RacerClass::Provisional),
        ]);
        let t = roster.move_entry("p2", Direction::Up).unwrap();
        assert_eq!(
            t,
            MoveTransition::Swap {
                neighbor: "p1".to_string()
            }
        );
        assert_eq!(order(&roster, "p2"), (RacerClass::Provisional, Some(1)));
        assert!(roster.move_entry("p2", Direction::Up).unwrap().is_stay());
        assert!(roster.move_entry("p1", Direction::Down).unwrap().is_stay());
    }

    #[test]
    fn dns_cannot_move() {
        let mut roster = roster_with(&[("a", RacerClass::JrVarsity)]);
        roster.reclassify("a", RacerClass::Dns).unwrap();
        assert!(matches!(
            roster.move_entry("a", Direction::Up),
            Err(SlalomError::InvalidState(_))
        ));
    }

    #[test]
    fn replace_from_skips_dns_and_overflow() {
        let mut source = roster_with(&[
            ("v1", RacerClass::Varsity),
            ("v2", RacerClass::Varsity),
            ("j1", RacerClass::JrVarsity),
            ("gone", RacerClass::JrVarsity),
        ]);
        source.reclassify("gone", RacerClass::Dns).unwrap();
        let mut entries = source.entries();
        // Corrupt source with a second alternate to exercise the cap.
        for id in ["a1", "a2"] {
            entries.push(RosterEntry {
                race_id: "r1".to_string(),
                team_id: "north".to_string(),
                racer_id: id.to_string(),
                racer_name: id.to_string(),
                gender: Gender::Female,
                base_class: RacerClass::JrVarsity,
                class: RacerClass::VarsityAlternate,
                start_order: Some(if id == "a1" { 1 } else { 2 }),
            });
        }

        let mut dest = TeamRoster::load("r2", "north", Vec::new());
        let dropped = dest.replace_from(&entries);
        assert_eq!(dropped, vec!["a2".to_string()]);
        assert!(dest.get("gone").is_none());
        assert_eq!(dest.get("v2").unwrap().race_id, "r2");
        assert_eq!(order(&dest, "v2"), (RacerClass::Varsity, Some(2)));
        assert_eq!(dest.changes().inserts.len(), 4);
        assert!(dest.violations().is_empty());
    }
}
