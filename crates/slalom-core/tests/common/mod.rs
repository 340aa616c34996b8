#![allow(dead_code)]

use std::sync::Arc;

use slalom_core::{EngineConfig, Gender, Race, Racer, RacerClass, RosterEntry, Slalom};
use slalom_state::fakes::MemoryDocumentStore;

pub type Engine = Slalom<MemoryDocumentStore>;

pub struct Fixture {
    pub slalom: Engine,
    pub store: Arc<MemoryDocumentStore>,
    pub race: Race,
}

/// A fresh store with one unlocked race and three league teams.
pub async fn fixture() -> Fixture {
    let store = Arc::new(MemoryDocumentStore::new());
    let slalom = Slalom::new(Arc::clone(&store), EngineConfig::default());
    for (id, name) in [("north", "North"), ("south", "South"), ("east", "East")] {
        slalom.directory.register_team(id, name, false).await.unwrap();
    }
    let race = slalom.races.create("Opener", Some("Ridge"), None).await.unwrap();
    Fixture {
        slalom,
        store,
        race,
    }
}

pub async fn racer(
    slalom: &Engine,
    team_id: &str,
    name: &str,
    gender: Gender,
    base: RacerClass,
) -> Racer {
    slalom
        .directory
        .register_racer(team_id, name, gender, base)
        .await
        .unwrap()
}

/// Register and roster `count` racers of one class.
pub async fn enter(
    fx: &Fixture,
    team_id: &str,
    gender: Gender,
    class: RacerClass,
    count: usize,
) -> Vec<Racer> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let name = format!("{team_id} {} {} {i}", gender.label(), class.label());
        let r = racer(&fx.slalom, team_id, &name, gender, class).await;
        fx.slalom
            .roster
            .add(&fx.race.id, team_id, &r.id, None)
            .await
            .unwrap();
        out.push(r);
    }
    out
}

pub fn find<'a>(roster: &'a [RosterEntry], racer_id: &str) -> &'a RosterEntry {
    roster
        .iter()
        .find(|e| e.racer_id == racer_id)
        .unwrap_or_else(|| panic!("{racer_id} not on roster"))
}

/// Assert the ordering, capacity and provisional invariants of a roster.
pub fn assert_roster_invariants(roster: &[RosterEntry]) {
    for gender in Gender::ALL {
        for class in RacerClass::SEEDED {
            let mut orders: Vec<u32> = roster
                .iter()
                .filter(|e| e.gender == gender && e.class == class)
                .map(|e| e.start_order.expect("seeded class without start order"))
                .collect();
            orders.sort_unstable();
            let expected: Vec<u32> = (1..=orders.len() as u32).collect();
            assert_eq!(orders, expected, "{gender} {class} orders");
            if let Some(cap) = class.capacity() {
                assert!(orders.len() <= cap, "{gender} {class} over cap");
            }
        }
    }
    for e in roster {
        if e.class == RacerClass::Dns {
            assert_eq!(e.start_order, None);
        }
        if e.base_class == RacerClass::Provisional {
            assert!(matches!(e.class, RacerClass::Provisional | RacerClass::Dns));
        }
    }
}
